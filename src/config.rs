//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use mealboard_core::db::Database;
use mealboard_core::MealPlanner;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const SQLITE_FILE: &str = "mealboard.db";

/// Where the recipe and meal-plan documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// One JSON file per document in the data directory.
    Json,
    /// One SQLite database with a row per document.
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => anyhow::bail!("unknown storage backend `{other}` (expected json or sqlite)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind (from MEALBOARD_HOST)
    pub host: String,
    /// Port to bind (from MEALBOARD_PORT)
    pub port: u16,
    /// Directory holding the documents (from MEALBOARD_DATA_DIR)
    pub data_dir: PathBuf,
    /// Storage backend (from MEALBOARD_BACKEND)
    pub backend: BackendKind,
    /// Allowed CORS origins (from MEALBOARD_CORS_ORIGINS, comma-separated).
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source. Unset variables take their
    /// defaults; set but invalid ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("MEALBOARD_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("MEALBOARD_PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("MEALBOARD_PORT is not a valid port: {port}"))?,
            None => DEFAULT_PORT,
        };

        let data_dir = match lookup("MEALBOARD_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let backend = match lookup("MEALBOARD_BACKEND") {
            Some(backend) => backend.parse()?,
            None => BackendKind::Json,
        };

        let cors_origins = lookup("MEALBOARD_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            host,
            port,
            data_dir,
            backend,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens both stores on the configured backend.
    pub fn open_planner(&self) -> Result<MealPlanner> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })?;

        match self.backend {
            BackendKind::Json => Ok(MealPlanner::open_json_dir(&self.data_dir)),
            BackendKind::Sqlite => {
                let db = Database::open(self.data_dir.join(SQLITE_FILE))?;
                db.migrate()?;
                Ok(MealPlanner::open_sqlite(&db))
            }
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "mealboard")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[("MEALBOARD_DATA_DIR", "/tmp/meals")])).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.backend, BackendKind::Json);
        assert!(config.cors_origins.is_none());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = Config::from_lookup(lookup(&[
            ("MEALBOARD_DATA_DIR", "/tmp/meals"),
            ("MEALBOARD_PORT", "8080"),
            ("MEALBOARD_BACKEND", "SQLite"),
            ("MEALBOARD_CORS_ORIGINS", "http://a.local, http://b.local,"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://a.local".to_string(), "http://b.local".to_string()])
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[
            ("MEALBOARD_DATA_DIR", "/tmp/meals"),
            ("MEALBOARD_PORT", "eighty"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("MEALBOARD_DATA_DIR", "/tmp/meals"),
            ("MEALBOARD_BACKEND", "postgres"),
        ]))
        .is_err());
    }

    #[test]
    fn sqlite_backend_opens_a_migrated_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(lookup(&[
            ("MEALBOARD_DATA_DIR", dir.path().to_str().unwrap()),
            ("MEALBOARD_BACKEND", "sqlite"),
        ]))
        .unwrap();

        let planner = config.open_planner().unwrap();
        assert!(planner.recipes().list().unwrap().is_empty());
        assert!(dir.path().join(SQLITE_FILE).exists());
    }
}
