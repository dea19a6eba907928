use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;
use uuid::Uuid;

use crate::ContactStatus;

/// Contact import error types
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported file: {0} (only .csv files can be imported)")]
    UnsupportedFile(String),

    #[error("CSV must contain an \"email\" column")]
    MissingEmailColumn,

    #[error("Unreadable file: {0}")]
    Unreadable(String),

    #[error("Import batch {batch} failed: {message}")]
    BatchFailed { batch: usize, message: String },

    #[error("Failed to refresh contacts and tags: {0}")]
    Refresh(String),

    #[error("Import cancelled")]
    Cancelled,

    #[error("Failed to write CSV export: {0}")]
    Export(String),
}

/// A parsed but not yet persisted row of an uploaded contact file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CandidateContact {
    /// Original spelling from the file; compare through [`CandidateContact::email_key`]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: ContactStatus,
    /// Tag names as typed in the file, in order
    pub tag_names: Vec<String>,
    /// Tag names that already matched a tag of the website at parse time
    pub tag_ids: BTreeSet<i64>,
}

impl CandidateContact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            status: ContactStatus::default(),
            tag_names: Vec::new(),
            tag_ids: BTreeSet::new(),
        }
    }

    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// What the user sees before confirming an import
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportPreview {
    pub contacts: Vec<CandidateContact>,
    pub duplicates: Vec<String>,
    pub existing: Vec<String>,
}

impl ImportPreview {
    pub fn message(&self) -> String {
        let mut message = format!("Found {} contacts to import", self.contacts.len());
        if !self.duplicates.is_empty() {
            message.push_str(&format!(", {} duplicates", self.duplicates.len()));
        }
        if !self.existing.is_empty() {
            message.push_str(&format!(", {} already exist", self.existing.len()));
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportRowError {
    pub email: String,
    pub error: String,
}

/// Outcome of one bulk create call, or the sum of several
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportResult {
    pub fn absorb(&mut self, other: ImportResult) {
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TagAssignment {
    pub contact_id: i64,
    pub tag_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TagFailureKind {
    Create,
    Assign,
}

/// A tag creation or assignment that did not go through during an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TagFailure {
    pub kind: TagFailureKind,
    pub tag_name: Option<String>,
    pub contact_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
    pub tags_created: Vec<String>,
    pub tag_assignments: usize,
    pub tag_failures: Vec<TagFailure>,
}

impl ImportSummary {
    pub fn from_result(result: ImportResult) -> Self {
        Self {
            imported: result.imported,
            skipped: result.skipped,
            errors: result.errors,
            ..Default::default()
        }
    }

    pub fn message(&self) -> String {
        let mut message = format!("Imported {}, skipped {}", self.imported, self.skipped);
        if !self.tags_created.is_empty() {
            message.push_str(&format!(", created {} tags", self.tags_created.len()));
        }
        if !self.errors.is_empty() {
            message.push_str(&format!(", {} errors", self.errors.len()));
        }
        message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ImportJobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportJob {
    pub id: Uuid,
    pub website_id: i64,
    pub status: ImportJobStatus,
    pub total_contacts: usize,
    pub summary: Option<ImportSummary>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct PreviewImportRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreviewImportResponse {
    pub preview: ImportPreview,
    pub message: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct StartImportRequest {
    pub contacts: Vec<CandidateContact>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StartImportResponse {
    pub job_id: Uuid,
}
