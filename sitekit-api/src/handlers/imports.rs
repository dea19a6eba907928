use actix_web::{web, HttpResponse, Result};
use shared_types::{
    PreviewImportRequest, PreviewImportResponse, StartImportRequest, StartImportResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::Database;
use crate::handlers::{require_website, ApiError};
use crate::jobs::import_manager::ImportManager;

pub async fn preview_import(
    db: web::Data<Arc<Database>>,
    manager: web::Data<Arc<ImportManager>>,
    path: web::Path<i64>,
    request: web::Json<PreviewImportRequest>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    let req = request.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let preview = manager
        .preview(website_id, &req.filename, &req.content)
        .await?;
    let message = preview.message();

    Ok(HttpResponse::Ok().json(PreviewImportResponse { preview, message }))
}

pub async fn start_import(
    db: web::Data<Arc<Database>>,
    manager: web::Data<Arc<ImportManager>>,
    path: web::Path<i64>,
    request: web::Json<StartImportRequest>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let contacts = request.into_inner().contacts;
    let total = contacts.len();
    let job_id = manager.start_import(website_id, contacts).await;

    tracing::info!(
        "Started import job {} for website {} with {} contacts",
        job_id,
        website_id,
        total
    );

    Ok(HttpResponse::Accepted().json(StartImportResponse { job_id }))
}

pub async fn get_import_job(
    manager: web::Data<Arc<ImportManager>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let job_id = path.into_inner();

    let job = manager
        .get_job(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Import job {} not found", job_id)))?;

    Ok(HttpResponse::Ok().json(job))
}

pub async fn cancel_import_job(
    manager: web::Data<Arc<ImportManager>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let job_id = path.into_inner();

    if manager.get_job(job_id).await.is_none() {
        return Err(ApiError::NotFound(format!("Import job {} not found", job_id)));
    }

    manager
        .cancel_job(job_id)
        .await
        .map_err(ApiError::validation)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "cancelling" })))
}
