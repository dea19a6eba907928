use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::jobs::contact_import::DEFAULT_BATCH_SIZE;

pub const DEFAULT_TAG_COLOR: &str = "#6b7280";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub import: Option<ImportConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            database: None,
            import: Some(ImportConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Overrides the platform data directory location
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_tag_color")]
    pub default_tag_color: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_tag_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_tag_color: default_tag_color(),
        }
    }
}

const DEFAULT_CONFIG: &str = r##"
[cors]
allowed_origins = ["http://localhost:3000"]

[server]
host = "127.0.0.1"
port = 8080

[database]
# path = "/var/lib/sitekit/sitekit.db"

[import]
batch_size = 500
default_tag_color = "#6b7280"
"##;

impl ApiConfig {
    /// Loads the config file, writing the default one first when it is missing.
    pub fn load(path_override: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path_override
            .map(Path::to_path_buf)
            .unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn host_and_port(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }

    pub fn import_settings(&self) -> ImportConfig {
        let mut settings = self.import.clone().unwrap_or_default();
        if settings.batch_size == 0 {
            tracing::warn!("import.batch_size must be positive, using {}", DEFAULT_BATCH_SIZE);
            settings.batch_size = DEFAULT_BATCH_SIZE;
        }
        settings
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.as_ref().and_then(|d| d.path.clone())
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("sitekit").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api.toml");

        let (config, loaded_from) = ApiConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded_from, path);
        assert!(path.exists());
        assert_eq!(config.host_and_port(), ("127.0.0.1".to_string(), 8080));
        let import = config.import_settings();
        assert_eq!(import.batch_size, 500);
        assert_eq!(import.default_tag_color, "#6b7280");
        assert!(config.database_path().is_none());
    }

    #[test]
    fn test_load_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
path = "/tmp/sites.db"

[import]
batch_size = 0
"#,
        )
        .unwrap();

        let (config, _) = ApiConfig::load(Some(&path)).unwrap();

        assert_eq!(config.host_and_port(), ("0.0.0.0".to_string(), 9000));
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/sites.db")));
        assert!(config.cors.is_none());
        let import = config.import_settings();
        assert_eq!(import.batch_size, 500);
        assert_eq!(import.default_tag_color, "#6b7280");
    }
}
