use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Result};
use shared_types::{ContactsResponse, CreateContactRequest, UpdateContactRequest};
use std::collections::HashSet;
use std::sync::Arc;

use crate::database::contacts::{self as contacts_db, is_valid_email};
use crate::database::tags as tags_db;
use crate::database::Database;
use crate::handlers::{require_website, ApiError};

fn csv_attachment(filename: String, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(body)
}

pub async fn list_contacts(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let contacts = contacts_db::list_contacts(db.async_connection.clone(), website_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Ok().json(ContactsResponse { contacts }))
}

pub async fn create_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    let req = request.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    if !is_valid_email(req.email.trim()) {
        return Err(ApiError::Validation(format!(
            "Invalid email address: {}",
            req.email.trim()
        )));
    }

    // Every requested tag must belong to this website
    let known: HashSet<i64> = tags_db::list_tags(db.async_connection.clone(), website_id)
        .await
        .map_err(ApiError::internal)?
        .into_iter()
        .map(|t| t.id)
        .collect();
    if let Some(unknown) = req.tag_ids.iter().find(|id| !known.contains(*id)) {
        return Err(ApiError::Validation(format!("Unknown tag {}", unknown)));
    }

    let contact = contacts_db::create_contact(
        db.async_connection.clone(),
        website_id,
        &req.email,
        &req.first_name,
        &req.last_name,
        req.status,
    )
    .await
    .map_err(ApiError::validation)?;

    for tag_id in &req.tag_ids {
        tags_db::assign_tag(db.async_connection.clone(), contact.id, *tag_id)
            .await
            .map_err(ApiError::internal)?;
    }

    let contact = contacts_db::get_contact(db.async_connection.clone(), contact.id)
        .await
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Created().json(contact))
}

pub async fn get_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let contact = contacts_db::get_contact(db.async_connection.clone(), path.into_inner())
        .await
        .map_err(ApiError::not_found)?;

    Ok(HttpResponse::Ok().json(contact))
}

pub async fn update_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<UpdateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let contact_id = path.into_inner();

    contacts_db::get_contact(db.async_connection.clone(), contact_id)
        .await
        .map_err(ApiError::not_found)?;

    let contact =
        contacts_db::update_contact(db.async_connection.clone(), contact_id, request.into_inner())
            .await
            .map_err(ApiError::validation)?;

    Ok(HttpResponse::Ok().json(contact))
}

pub async fn delete_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    contacts_db::delete_contact(db.async_connection.clone(), path.into_inner())
        .await
        .map_err(ApiError::not_found)?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn export_contacts(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let website_id = path.into_inner();
    require_website(db.async_connection.clone(), website_id).await?;

    let contacts = contacts_db::list_contacts(db.async_connection.clone(), website_id)
        .await
        .map_err(ApiError::internal)?;
    let csv = importers::export_contacts(&contacts).map_err(ApiError::internal)?;

    tracing::info!("Exported {} contacts of website {}", contacts.len(), website_id);

    Ok(csv_attachment(format!("contacts-{}.csv", website_id), csv))
}

pub async fn sample_import_file() -> Result<HttpResponse, ApiError> {
    let csv = importers::sample_csv().map_err(ApiError::internal)?;

    Ok(csv_attachment("contacts-sample.csv".to_string(), csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_database;
    use crate::database::websites;
    use actix_web::{http::StatusCode, test, App};
    use shared_types::{Contact, ContactStatus};

    #[actix_web::test]
    async fn test_create_contact_with_tags_and_export() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();
        let vip = tags_db::create_tag(conn.clone(), site.id, "VIP", "#ff0000", false)
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.clone()))
                .route("/api/websites/{id}/contacts", web::post().to(create_contact))
                .route("/api/websites/{id}/contacts/export", web::get().to(export_contacts)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/websites/{}/contacts", site.id))
            .set_json(serde_json::json!({
                "email": "ann@x.com",
                "first_name": "Ann",
                "status": "active",
                "tag_ids": [vip.id]
            }))
            .to_request();
        let contact: Contact = test::call_and_read_body_json(&app, req).await;
        assert_eq!(contact.status, ContactStatus::Active);
        assert!(contact.has_tag(vip.id));

        let req = test::TestRequest::post()
            .uri(&format!("/api/websites/{}/contacts", site.id))
            .set_json(serde_json::json!({ "email": "not-an-email" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/websites/{}/contacts/export", site.id))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let csv = String::from_utf8(body.to_vec()).unwrap();
        assert!(csv.starts_with("email,first_name,last_name,status,tags"));
        assert!(csv.contains("ann@x.com,Ann,,active,VIP"));
    }

    #[actix_web::test]
    async fn test_unknown_website_is_not_found() {
        let (_dir, db) = test_database();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.clone()))
                .route("/api/websites/{id}/contacts", web::get().to(list_contacts)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/websites/404/contacts")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
