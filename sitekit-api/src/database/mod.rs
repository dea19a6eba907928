pub mod contacts;
pub mod migrations;
pub mod tags;
pub mod websites;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type DbConnection = Arc<Mutex<Connection>>;

/// Case-folded form used for the unique email and tag name columns
pub fn lookup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn lock(&self) -> anyhow::Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get DB connection from pool: {}", e))
    }
}

pub struct Database {
    pub connection: DbConnection,
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Create a new database connection and run migrations
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Run migrations on a sync connection before the pool opens
        let sync_conn = Connection::open(db_path)?;
        sync_conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&sync_conn)?;
        let sync_mutex = Arc::new(Mutex::new(sync_conn));

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        Ok(Database {
            connection: sync_mutex,
            async_connection: AsyncDbConnection::new(pool),
        })
    }

    /// Liveness check used by the health endpoint
    pub fn ping(&self) -> anyhow::Result<()> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection mutex poisoned"))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// A migrated database in a temp dir; keep the dir alive with the database.
    pub fn test_database() -> (TempDir, Arc<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("sitekit.db")).unwrap();
        (dir, Arc::new(db))
    }
}
