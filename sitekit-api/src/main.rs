use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use sitekit_api::config::ApiConfig;
use sitekit_api::handlers;
use sitekit_api::helpers;
use sitekit_api::jobs::contact_import::{ImportPipeline, SqliteImportBackend};
use sitekit_api::jobs::import_manager::ImportManager;
use sitekit_api::Database;

#[get("/health")]
async fn health(db: web::Data<Arc<Database>>) -> impl Responder {
    match db.ping() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Use this config file instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(log_file_path: Option<String>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("sitekit-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path);

    let (config, config_path) = ApiConfig::load(args.config.as_deref())
        .map_err(|e| startup_error("Failed to load config", e))?;
    tracing::info!("Loaded config from {:?}", config_path);

    let db_override = config.database_path();
    let (db, db_path) = helpers::database::initialize_database(db_override.as_deref())
        .map_err(|e| startup_error("Failed to initialize database", e))?;
    tracing::info!("Database initialized at: {:?}", db_path);

    let import_settings = config.import_settings();
    let backend = Arc::new(SqliteImportBackend::new(
        db.async_connection.clone(),
        import_settings.default_tag_color.clone(),
    ));
    let import_manager = Arc::new(ImportManager::new(Arc::new(ImportPipeline::new(
        backend,
        import_settings.batch_size,
    ))));

    let (host, port) = config.host_and_port();
    tracing::info!("Starting server on {}:{}", host, port);

    let manager_for_server = import_manager.clone();
    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            // CSV uploads arrive as JSON strings
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(manager_for_server.clone()))
            .app_data(web::Data::new(import_settings.clone()))
            .service(health)
            .route("/api/websites", web::post().to(handlers::websites::create_website))
            .route("/api/websites", web::get().to(handlers::websites::list_websites))
            .route("/api/websites/{id}", web::get().to(handlers::websites::get_website))
            .route("/api/websites/{id}/contacts", web::get().to(handlers::contacts::list_contacts))
            .route("/api/websites/{id}/contacts", web::post().to(handlers::contacts::create_contact))
            .route("/api/websites/{id}/contacts/export", web::get().to(handlers::contacts::export_contacts))
            .route("/api/websites/{id}/contacts/import/preview", web::post().to(handlers::imports::preview_import))
            .route("/api/websites/{id}/contacts/import", web::post().to(handlers::imports::start_import))
            .route("/api/websites/{id}/tags", web::get().to(handlers::tags::list_tags))
            .route("/api/websites/{id}/tags", web::post().to(handlers::tags::create_tag))
            .route("/api/contacts/import/sample", web::get().to(handlers::contacts::sample_import_file))
            .route("/api/contacts/{id}", web::get().to(handlers::contacts::get_contact))
            .route("/api/contacts/{id}", web::put().to(handlers::contacts::update_contact))
            .route("/api/contacts/{id}", web::delete().to(handlers::contacts::delete_contact))
            .route("/api/contacts/{id}/tags/{tag_id}", web::post().to(handlers::tags::assign_tag))
            .route("/api/contacts/{id}/tags/{tag_id}", web::delete().to(handlers::tags::unassign_tag))
            .route("/api/tags/{id}", web::delete().to(handlers::tags::delete_tag))
            .route("/api/imports/{job_id}", web::get().to(handlers::imports::get_import_job))
            .route("/api/imports/{job_id}/cancel", web::post().to(handlers::imports::cancel_import_job))
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    let shutdown_manager = import_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        shutdown_manager.shutdown().await;

        handle.stop(true).await;
    });

    server.await
}
