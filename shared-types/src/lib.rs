use serde::{Deserialize, Serialize};

pub mod contact;
pub mod import;
pub mod tag;
pub mod website;

pub use contact::{
    Contact, ContactStatus, ContactsResponse, CreateContactRequest, UpdateContactRequest,
};
pub use import::{
    CandidateContact, ImportError, ImportJob, ImportJobStatus, ImportPreview, ImportResult,
    ImportRowError, ImportSummary, PreviewImportRequest, PreviewImportResponse,
    StartImportRequest, StartImportResponse, TagAssignment, TagFailure, TagFailureKind,
};
pub use tag::{CreateTagRequest, Tag, TagsResponse};
pub use website::{CreateWebsiteRequest, Website, WebsitesResponse};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
