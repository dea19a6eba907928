use crate::jobs::contact_import::ImportPipeline;
use anyhow::Result;
use shared_types::{CandidateContact, ImportError, ImportJob, ImportJobStatus, ImportPreview};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How long a finished job stays readable before it is dropped
pub const FINISHED_JOB_RETENTION: Duration = Duration::from_secs(30 * 60);

struct ImportJobEntry {
    job: ImportJob,
    cancel: CancellationToken,
    finished: Option<Instant>,
}

/// Runs confirmed imports in the background and keeps their outcome for a while
pub struct ImportManager {
    pipeline: Arc<ImportPipeline>,
    jobs: Arc<Mutex<HashMap<Uuid, ImportJobEntry>>>,
    retention: Duration,
}

impl ImportManager {
    pub fn new(pipeline: Arc<ImportPipeline>) -> Self {
        Self::with_retention(pipeline, FINISHED_JOB_RETENTION)
    }

    pub fn with_retention(pipeline: Arc<ImportPipeline>, retention: Duration) -> Self {
        Self {
            pipeline,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    /// Drops finished jobs older than the retention window; running jobs stay.
    pub async fn evict_finished(&self, now: Instant) -> usize {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.finished {
            Some(finished) => now.saturating_duration_since(finished) < self.retention,
            None => true,
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} finished import jobs", evicted);
        }
        evicted
    }

    pub async fn preview(
        &self,
        website_id: i64,
        filename: &str,
        content: &str,
    ) -> Result<ImportPreview, ImportError> {
        self.pipeline.preview(website_id, filename, content).await
    }

    pub async fn start_import(&self, website_id: i64, contacts: Vec<CandidateContact>) -> Uuid {
        self.evict_finished(Instant::now()).await;

        let job_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let job = ImportJob {
            id: job_id,
            website_id,
            status: ImportJobStatus::Running,
            total_contacts: contacts.len(),
            summary: None,
            message: None,
            error: None,
            started_at: chrono::Utc::now().timestamp(),
            finished_at: None,
        };

        // Registered before spawning so a fast job always finds its entry
        self.jobs.lock().await.insert(
            job_id,
            ImportJobEntry {
                job,
                cancel: cancel.clone(),
                finished: None,
            },
        );

        let pipeline = self.pipeline.clone();
        let jobs = self.jobs.clone();

        tokio::spawn(async move {
            let outcome = pipeline.run(website_id, contacts, cancel).await;

            let mut jobs = jobs.lock().await;
            let Some(entry) = jobs.get_mut(&job_id) else {
                return;
            };

            entry.finished = Some(Instant::now());
            entry.job.finished_at = Some(chrono::Utc::now().timestamp());
            match outcome {
                Ok(summary) => {
                    entry.job.status = ImportJobStatus::Completed;
                    entry.job.message = Some(summary.message());
                    entry.job.summary = Some(summary);
                }
                Err(ImportError::Cancelled) => {
                    tracing::info!("Import job {} cancelled", job_id);
                    entry.job.status = ImportJobStatus::Cancelled;
                    entry.job.error = Some(ImportError::Cancelled.to_string());
                }
                Err(e) => {
                    tracing::error!("Import job {} failed: {}", job_id, e);
                    entry.job.status = ImportJobStatus::Failed;
                    entry.job.error = Some(e.to_string());
                }
            }
        });

        job_id
    }

    pub async fn get_job(&self, job_id: Uuid) -> Option<ImportJob> {
        self.evict_finished(Instant::now()).await;
        self.jobs.lock().await.get(&job_id).map(|e| e.job.clone())
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<()> {
        let jobs = self.jobs.lock().await;
        let entry = jobs
            .get(&job_id)
            .ok_or_else(|| anyhow::anyhow!("Import job {} not found", job_id))?;

        if entry.job.status != ImportJobStatus::Running {
            return Err(anyhow::anyhow!("Import job {} is not running", job_id));
        }

        entry.cancel.cancel();
        Ok(())
    }

    /// Cancels every running import
    pub async fn shutdown(&self) {
        let jobs = self.jobs.lock().await;
        for entry in jobs.values() {
            if entry.job.status == ImportJobStatus::Running {
                entry.cancel.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_database;
    use crate::database::{contacts as contacts_db, websites};
    use crate::jobs::contact_import::{SqliteImportBackend, DEFAULT_BATCH_SIZE};

    async fn wait_for(manager: &ImportManager, job_id: Uuid) -> ImportJob {
        for _ in 0..200 {
            let job = manager.get_job(job_id).await.unwrap();
            if job.status != ImportJobStatus::Running {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("import job {} did not finish", job_id);
    }

    #[tokio::test]
    async fn test_import_job_against_sqlite() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", Some("bakery.example"))
            .await
            .unwrap();

        let backend = Arc::new(SqliteImportBackend::new(conn.clone(), "#6b7280"));
        let manager = ImportManager::new(Arc::new(ImportPipeline::new(backend, DEFAULT_BATCH_SIZE)));

        let content = "email,first_name,last_name,status,tags\n\
                       a@x.com,A,One,active,\"VIP, Lead\"\n\
                       a@x.com,Dup,Row,pending,\n\
                       b@x.com,B,Two,,Lead\n";
        let preview = manager.preview(site.id, "contacts.csv", content).await.unwrap();
        assert_eq!(preview.duplicates, vec!["a@x.com"]);

        let job_id = manager.start_import(site.id, preview.contacts).await;
        let job = wait_for(&manager, job_id).await;

        assert_eq!(job.status, ImportJobStatus::Completed);
        let summary = job.summary.unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.tags_created, vec!["VIP", "Lead"]);
        assert_eq!(summary.tag_assignments, 3);
        assert_eq!(job.message.as_deref(), Some("Imported 2, skipped 0, created 2 tags"));

        let contacts = contacts_db::list_contacts(conn.clone(), site.id).await.unwrap();
        let a = contacts.iter().find(|c| c.email == "a@x.com").unwrap();
        let b = contacts.iter().find(|c| c.email == "b@x.com").unwrap();
        let mut a_tags: Vec<_> = a.tags.iter().map(|t| t.name.as_str()).collect();
        a_tags.sort();
        assert_eq!(a_tags, vec!["Lead", "VIP"]);
        assert_eq!(b.tags.len(), 1);
        assert_eq!(b.tags[0].name, "Lead");

        let again = manager.preview(site.id, "contacts.csv", content).await.unwrap();
        assert!(again.contacts.is_empty());
        assert_eq!(again.existing, vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_failed_import_job_reports_error() {
        let (_dir, db) = test_database();
        let backend = Arc::new(SqliteImportBackend::new(db.async_connection.clone(), "#6b7280"));
        let manager = ImportManager::new(Arc::new(ImportPipeline::new(backend, DEFAULT_BATCH_SIZE)));

        // No such website, so the first batch is rejected as a whole
        let job_id = manager
            .start_import(99, vec![CandidateContact::new("a@x.com")])
            .await;
        let job = wait_for(&manager, job_id).await;

        assert_eq!(job.status, ImportJobStatus::Failed);
        assert!(job.error.unwrap().contains("batch 0"));
        assert!(manager.cancel_job(job_id).await.is_err());
        assert!(manager.cancel_job(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn test_finished_jobs_are_evicted_after_retention() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();
        let backend = Arc::new(SqliteImportBackend::new(conn, "#6b7280"));
        let manager = ImportManager::with_retention(
            Arc::new(ImportPipeline::new(backend, DEFAULT_BATCH_SIZE)),
            Duration::from_secs(60),
        );

        let job_id = manager
            .start_import(site.id, vec![CandidateContact::new("a@x.com")])
            .await;
        let job = wait_for(&manager, job_id).await;
        assert_eq!(job.status, ImportJobStatus::Completed);

        // Still inside the window
        assert_eq!(manager.evict_finished(Instant::now()).await, 0);
        assert!(manager.get_job(job_id).await.is_some());

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(manager.evict_finished(later).await, 1);
        assert!(manager.get_job(job_id).await.is_none());
    }

    #[tokio::test]
    async fn test_new_tag_keeps_first_spelling_from_file() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();
        let backend = Arc::new(SqliteImportBackend::new(conn.clone(), "#6b7280"));
        let manager = ImportManager::new(Arc::new(ImportPipeline::new(backend, DEFAULT_BATCH_SIZE)));

        let preview = manager
            .preview(site.id, "tags.csv", "email,tags\na@x.com,Lead\nb@x.com,LEAD\n")
            .await
            .unwrap();
        let job_id = manager.start_import(site.id, preview.contacts).await;
        let job = wait_for(&manager, job_id).await;

        let summary = job.summary.unwrap();
        assert_eq!(summary.tags_created, vec!["Lead"]);
        assert_eq!(summary.tag_assignments, 2);
    }
}
