//! Persists confirmed contact imports and reconciles their tags.
//!
//! Batches go to the backend one after another. Once every batch is stored the
//! contact and tag lists are fetched again, missing tags are created (all at
//! once, then joined) and only after that are tags assigned.

use crate::database::{contacts as contacts_db, tags as tags_db, AsyncDbConnection};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use importers::contact_csv::{ensure_csv_filename, tag_index, ContactCsvImporter};
use shared_types::{
    CandidateContact, Contact, ImportError, ImportPreview, ImportResult, ImportSummary, Tag,
    TagAssignment, TagFailure, TagFailureKind,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Storage the import pipeline talks to
#[async_trait]
pub trait ImportBackend: Send + Sync {
    async fn list_contacts(&self, website_id: i64) -> Result<Vec<Contact>>;

    async fn list_tags(&self, website_id: i64) -> Result<Vec<Tag>>;

    /// Must return the existing tag when the name is already taken.
    async fn create_tag(&self, website_id: i64, name: &str) -> Result<Tag>;

    /// Must succeed when the pair is already assigned.
    async fn assign_tag(&self, contact_id: i64, tag_id: i64) -> Result<()>;

    async fn bulk_create_contacts(
        &self,
        website_id: i64,
        rows: &[CandidateContact],
    ) -> Result<ImportResult>;
}

pub struct SqliteImportBackend {
    db_conn: AsyncDbConnection,
    default_tag_color: String,
}

impl SqliteImportBackend {
    pub fn new(db_conn: AsyncDbConnection, default_tag_color: impl Into<String>) -> Self {
        Self {
            db_conn,
            default_tag_color: default_tag_color.into(),
        }
    }
}

#[async_trait]
impl ImportBackend for SqliteImportBackend {
    async fn list_contacts(&self, website_id: i64) -> Result<Vec<Contact>> {
        contacts_db::list_contacts(self.db_conn.clone(), website_id).await
    }

    async fn list_tags(&self, website_id: i64) -> Result<Vec<Tag>> {
        tags_db::list_tags(self.db_conn.clone(), website_id).await
    }

    async fn create_tag(&self, website_id: i64, name: &str) -> Result<Tag> {
        tags_db::create_tag(
            self.db_conn.clone(),
            website_id,
            name,
            &self.default_tag_color,
            false,
        )
        .await
    }

    async fn assign_tag(&self, contact_id: i64, tag_id: i64) -> Result<()> {
        tags_db::assign_tag(self.db_conn.clone(), contact_id, tag_id).await
    }

    async fn bulk_create_contacts(
        &self,
        website_id: i64,
        rows: &[CandidateContact],
    ) -> Result<ImportResult> {
        contacts_db::bulk_create_contacts(self.db_conn.clone(), website_id, rows).await
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), ImportError> {
    if cancel.is_cancelled() {
        Err(ImportError::Cancelled)
    } else {
        Ok(())
    }
}

/// Submits candidates in fixed-size batches, strictly in order
pub struct BatchSubmitter {
    batch_size: usize,
}

impl BatchSubmitter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub async fn submit(
        &self,
        backend: &dyn ImportBackend,
        website_id: i64,
        contacts: &[CandidateContact],
        cancel: &CancellationToken,
    ) -> Result<ImportResult, ImportError> {
        let mut total = ImportResult::default();

        for (batch, chunk) in contacts.chunks(self.batch_size).enumerate() {
            ensure_not_cancelled(cancel)?;

            let result = backend
                .bulk_create_contacts(website_id, chunk)
                .await
                .map_err(|e| ImportError::BatchFailed {
                    batch,
                    message: e.to_string(),
                })?;

            tracing::debug!(
                "Import batch {} for website {}: {} imported, {} skipped, {} errors",
                batch,
                website_id,
                result.imported,
                result.skipped,
                result.errors.len()
            );

            total.absorb(result);
        }

        Ok(total)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagReport {
    pub created: Vec<String>,
    pub assigned: usize,
    pub failures: Vec<TagFailure>,
}

/// Queue of assignments that never holds the same pair twice
#[derive(Default)]
struct AssignmentQueue {
    queued: HashSet<TagAssignment>,
    order: Vec<TagAssignment>,
}

impl AssignmentQueue {
    fn push(&mut self, contact: &Contact, tag_id: i64) {
        if contact.has_tag(tag_id) {
            return;
        }
        let assignment = TagAssignment {
            contact_id: contact.id,
            tag_id,
        };
        if self.queued.insert(assignment) {
            self.order.push(assignment);
        }
    }
}

/// Creates the tags an import refers to and assigns them to imported contacts
pub struct TagReconciler;

impl TagReconciler {
    pub async fn reconcile(
        &self,
        backend: &dyn ImportBackend,
        website_id: i64,
        rows: &[CandidateContact],
        contacts: &[Contact],
        tags: Vec<Tag>,
        cancel: &CancellationToken,
    ) -> Result<TagReport, ImportError> {
        // Walk the rows in file order so the first spelling of a tag wins
        let stored_by_email: HashMap<String, &Contact> = contacts
            .iter()
            .map(|c| (c.email.trim().to_lowercase(), c))
            .collect();
        let imported: Vec<(&Contact, &CandidateContact)> = rows
            .iter()
            .filter_map(|row| stored_by_email.get(&row.email_key()).map(|c| (*c, row)))
            .collect();

        let mut report = TagReport::default();
        let mut index = tag_index(&tags);
        let known_ids: HashSet<i64> = tags.iter().map(|t| t.id).collect();
        let mut queue = AssignmentQueue::default();

        // Pass 1: queue tags that already exist, collect the missing names
        let mut missing_seen: HashSet<String> = HashSet::new();
        let mut to_create: Vec<String> = Vec::new();

        for (contact, row) in &imported {
            for name in &row.tag_names {
                let key = name.to_lowercase();
                match index.get(&key) {
                    Some(&tag_id) => queue.push(contact, tag_id),
                    None => {
                        if missing_seen.insert(key) {
                            to_create.push(name.clone());
                        }
                    }
                }
            }
            for &tag_id in row.tag_ids.iter().filter(|id| known_ids.contains(*id)) {
                queue.push(contact, tag_id);
            }
        }

        // Create every missing tag once; nothing is assigned until all are done
        if !to_create.is_empty() {
            ensure_not_cancelled(cancel)?;

            let created = join_all(
                to_create
                    .iter()
                    .map(|name| backend.create_tag(website_id, name)),
            )
            .await;

            for (name, outcome) in to_create.iter().zip(created) {
                match outcome {
                    Ok(tag) => {
                        index.insert(tag.name.to_lowercase(), tag.id);
                        report.created.push(tag.name);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to create tag {:?} during import: {}", name, e);
                        report.failures.push(TagFailure {
                            kind: TagFailureKind::Create,
                            tag_name: Some(name.clone()),
                            contact_id: None,
                            tag_id: None,
                            error: e.to_string(),
                        });
                    }
                }
            }

            match backend.list_tags(website_id).await {
                Ok(refreshed) => {
                    for tag in &refreshed {
                        index.insert(tag.name.to_lowercase(), tag.id);
                    }
                }
                Err(e) => tracing::warn!("Failed to refresh tags after import: {}", e),
            }
        }

        // Pass 2: resolve every name against the complete map
        for (contact, row) in &imported {
            for name in &row.tag_names {
                if let Some(&tag_id) = index.get(&name.to_lowercase()) {
                    queue.push(contact, tag_id);
                }
            }
        }

        for assignment in queue.order {
            ensure_not_cancelled(cancel)?;

            match backend
                .assign_tag(assignment.contact_id, assignment.tag_id)
                .await
            {
                Ok(()) => report.assigned += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to assign tag {} to contact {}: {}",
                        assignment.tag_id,
                        assignment.contact_id,
                        e
                    );
                    report.failures.push(TagFailure {
                        kind: TagFailureKind::Assign,
                        tag_name: None,
                        contact_id: Some(assignment.contact_id),
                        tag_id: Some(assignment.tag_id),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Preview and import of contact files for any website
pub struct ImportPipeline {
    backend: Arc<dyn ImportBackend>,
    submitter: BatchSubmitter,
}

impl ImportPipeline {
    pub fn new(backend: Arc<dyn ImportBackend>, batch_size: usize) -> Self {
        Self {
            backend,
            submitter: BatchSubmitter::new(batch_size),
        }
    }

    pub async fn preview(
        &self,
        website_id: i64,
        filename: &str,
        content: &str,
    ) -> Result<ImportPreview, ImportError> {
        ensure_csv_filename(filename)?;

        let (contacts, tags) = self.load(website_id).await?;
        let preview = ContactCsvImporter::new(tags, &contacts).preview(content)?;

        tracing::info!("Import preview for website {}: {}", website_id, preview.message());

        Ok(preview)
    }

    pub async fn run(
        &self,
        website_id: i64,
        contacts: Vec<CandidateContact>,
        cancel: CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        tracing::info!(
            "Importing {} contacts into website {}",
            contacts.len(),
            website_id
        );

        let result = self
            .submitter
            .submit(self.backend.as_ref(), website_id, &contacts, &cancel)
            .await?;

        ensure_not_cancelled(&cancel)?;

        // Batch results carry no ids, so read back what is now stored
        let (stored, tags) = self.load(website_id).await?;

        let report = TagReconciler
            .reconcile(
                self.backend.as_ref(),
                website_id,
                &contacts,
                &stored,
                tags,
                &cancel,
            )
            .await?;

        let mut summary = ImportSummary::from_result(result);
        summary.tags_created = report.created;
        summary.tag_assignments = report.assigned;
        summary.tag_failures = report.failures;

        tracing::info!("Import into website {} finished: {}", website_id, summary.message());

        Ok(summary)
    }

    async fn load(&self, website_id: i64) -> Result<(Vec<Contact>, Vec<Tag>), ImportError> {
        tokio::try_join!(
            self.backend.list_contacts(website_id),
            self.backend.list_tags(website_id)
        )
        .map_err(|e| ImportError::Refresh(e.to_string()))
    }
}
