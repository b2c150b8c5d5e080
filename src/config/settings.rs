//! Application settings loading from config.toml
//!
//! Settings come from an optional TOML file; any field left out takes its default.
//! The `DATABASE_URL` and `EXAMS_DIR` environment variables (a `.env` file is loaded
//! by the binary beforehand) override whatever the file says.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default directory for uploaded exam artifacts
pub const DEFAULT_EXAMS_DIR: &str = "data/exams";

/// Configuration structure representing the config.toml file
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// `SeaORM` connection URL of the store
    pub database_url: String,
    /// Directory the exam blob store writes into
    pub exams_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            exams_dir: PathBuf::from(DEFAULT_EXAMS_DIR),
        }
    }
}

impl Settings {
    /// Replaces fields with values from `DATABASE_URL` / `EXAMS_DIR` when set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("EXAMS_DIR").ok(),
        )
    }

    fn with_overrides(mut self, database_url: Option<String>, exams_dir: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            self.database_url = url;
        }
        if let Some(dir) = exams_dir.filter(|d| !d.trim().is_empty()) {
            self.exams_dir = PathBuf::from(dir);
        }
        self
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file that must exist.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading settings from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `path` if the file exists, falling back to defaults,
/// then applies environment overrides.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    let settings = if path_ref.exists() {
        load_settings(path_ref)?
    } else {
        tracing::debug!("No config file at {}, using defaults", path_ref.display());
        Settings::default()
    };
    Ok(settings.with_env_overrides())
}
