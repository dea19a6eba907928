use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::database::Database;

/// Returns the path to the sitekit database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/sitekit/sitekit.db`
/// - **Linux**: `~/.local/share/sitekit/sitekit.db`
/// - **Windows**: `%LOCALAPPDATA%\sitekit\sitekit.db`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("sitekit").join("sitekit.db"))
}

/// Opens (and migrates) the database, keeping any existing data.
pub fn initialize_database(path_override: Option<&Path>) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = match path_override {
        Some(path) => path.to_path_buf(),
        None => get_db_path()?,
    };

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}
