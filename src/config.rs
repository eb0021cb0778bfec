//! Runtime configuration from `SLECARE_*` environment variables.

use std::path::PathBuf;

use crate::domain::Pipeline;

/// Error type for unusable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("model directory {} not found (set SLECARE_MODEL_DIR)", .0.display())]
    ModelDirMissing(PathBuf),
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve to a concrete choice: `true` means log to file.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub export_dir: PathBuf,
    pub initial_pipeline: Pipeline,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let initial_pipeline = match get("SLECARE_PIPELINE") {
            Some(value) => Pipeline::from_dir_name(value.trim()).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown SLECARE_PIPELINE, using current state");
                Pipeline::CurrentState
            }),
            None => Pipeline::CurrentState,
        };

        Self {
            model_dir: path("SLECARE_MODEL_DIR", "models"),
            asset_dir: path("SLECARE_ASSET_DIR", "assets"),
            export_dir: path("SLECARE_EXPORT_DIR", "."),
            initial_pipeline,
            log_mode: get("SLECARE_LOG_MODE").map_or(LogMode::Auto, |v| LogMode::parse(&v)),
            log_file: path("SLECARE_LOG_FILE", "slecare.log"),
        }
    }

    /// Check that the model directory exists.
    ///
    /// # Errors
    /// Returns `ModelDirMissing` if the model directory is not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_dir.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::ModelDirMissing(self.model_dir.clone()))
        }
    }
}
