use actix_web::{web, HttpResponse, Result};
use shared_types::{CreateWebsiteRequest, WebsitesResponse};
use std::sync::Arc;

use crate::database::websites as websites_db;
use crate::database::Database;
use crate::handlers::ApiError;

pub async fn create_website(
    db: web::Data<Arc<Database>>,
    request: web::Json<CreateWebsiteRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Website name must not be empty"));
    }
    let domain = req
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let website = websites_db::create_website(db.async_connection.clone(), name, domain)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!("Created website {} ({})", website.id, website.name);

    Ok(HttpResponse::Created().json(website))
}

pub async fn list_websites(db: web::Data<Arc<Database>>) -> Result<HttpResponse, ApiError> {
    let websites = websites_db::list_websites(db.async_connection.clone())
        .await
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Ok().json(WebsitesResponse { websites }))
}

pub async fn get_website(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let website = websites_db::get_website(db.async_connection.clone(), path.into_inner())
        .await
        .map_err(ApiError::not_found)?;

    Ok(HttpResponse::Ok().json(website))
}
