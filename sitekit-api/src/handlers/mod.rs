pub mod contacts;
pub mod imports;
pub mod tags;
pub mod websites;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use shared_types::{ErrorResponse, ImportError, Website};

use crate::database::{websites as websites_db, AsyncDbConnection};

/// Errors returned by the JSON API, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }

    pub fn not_found(e: impl std::fmt::Display) -> Self {
        ApiError::NotFound(e.to_string())
    }

    pub fn validation(e: impl std::fmt::Display) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::UnsupportedFile(_)
            | ImportError::MissingEmailColumn
            | ImportError::Unreadable(_) => ApiError::Validation(e.to_string()),
            ImportError::BatchFailed { .. }
            | ImportError::Refresh(_)
            | ImportError::Cancelled
            | ImportError::Export(_) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Loads the website a nested route points at, or answers 404
pub(crate) async fn require_website(
    conn: AsyncDbConnection,
    website_id: i64,
) -> Result<Website, ApiError> {
    websites_db::get_website(conn, website_id)
        .await
        .map_err(|_| ApiError::NotFound(format!("Website {} not found", website_id)))
}
