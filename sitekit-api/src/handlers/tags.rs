use actix_web::{web, HttpResponse, Result};
use shared_types::{CreateTagRequest, TagsResponse};
use std::sync::Arc;

use crate::config::ImportConfig;
use crate::database::contacts as contacts_db;
use crate::database::tags as tags_db;
use crate::database::Database;
use crate::handlers::{require_website, ApiError};

pub async fn list_tags(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let tags = tags_db::list_tags(db.async_connection.clone(), website_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Ok().json(TagsResponse { tags }))
}

pub async fn create_tag(
    db: web::Data<Arc<Database>>,
    settings: web::Data<ImportConfig>,
    path: web::Path<i64>,
    request: web::Json<CreateTagRequest>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    let req = request.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let color = req
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| settings.default_tag_color.clone());

    let tag = tags_db::create_tag(db.async_connection.clone(), website_id, &req.name, &color, false)
        .await
        .map_err(ApiError::validation)?;

    Ok(HttpResponse::Created().json(tag))
}

pub async fn delete_tag(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let tag_id = path.into_inner();

    let tag = tags_db::get_tag(db.async_connection.clone(), tag_id)
        .await
        .map_err(ApiError::not_found)?;
    if tag.is_system {
        return Err(ApiError::Validation(format!(
            "System tag {} cannot be deleted",
            tag.name
        )));
    }

    tags_db::delete_tag(db.async_connection.clone(), tag_id)
        .await
        .map_err(ApiError::not_found)?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn assign_tag(
    db: web::Data<Arc<Database>>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, ApiError> {
    let (contact_id, tag_id) = path.into_inner();

    contacts_db::get_contact(db.async_connection.clone(), contact_id)
        .await
        .map_err(|_| ApiError::NotFound(format!("Contact {} not found", contact_id)))?;
    tags_db::get_tag(db.async_connection.clone(), tag_id)
        .await
        .map_err(|_| ApiError::NotFound(format!("Tag {} not found", tag_id)))?;

    // Both exist, so a failure here is a tag from another website
    tags_db::assign_tag(db.async_connection.clone(), contact_id, tag_id)
        .await
        .map_err(ApiError::validation)?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn unassign_tag(
    db: web::Data<Arc<Database>>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, ApiError> {
    let (contact_id, tag_id) = path.into_inner();

    tags_db::unassign_tag(db.async_connection.clone(), contact_id, tag_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::NoContent().finish())
}
