use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{ReadingConfig, StorageConfig};

/// Deployment mode. Only affects which database file is used by default.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Production,
    #[default]
    Development,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Explicit connection URL. When unset the URL follows the run mode.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: RunMode,
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("INKWELL_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("mode", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.upload_dir", "_posts")?
            .set_default("storage.base_url", "http://localhost:3000/files")?
            .set_default("reading.words_per_minute", 200)?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., INKWELL__SERVER__PORT)
            .add_source(Environment::with_prefix("INKWELL").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Database URL in effect: the configured one, else a SQLite file chosen by mode.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }
        match self.mode {
            RunMode::Production => "sqlite://app.db?mode=rwc".to_string(),
            RunMode::Development => "sqlite://app-dev.db?mode=rwc".to_string(),
        }
    }
}
