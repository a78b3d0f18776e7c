use crate::config::settings::TrackerConfig;
use crate::config::validator::{ConfigValidator, ValidationResult};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {}", format_results(.0))]
    Validation(Vec<ValidationResult>),
}

fn format_results(results: &[ValidationResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}: {}", r.field, r.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loads and stores the TOML configuration file
#[derive(Debug, Clone)]
pub struct ConfigPersistence {
    path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/wintrack/config.toml`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wintrack")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the configuration. A missing file yields defaults.
    pub fn load(&self) -> Result<TrackerConfig, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No configuration file, using defaults");
            return Ok(TrackerConfig::default());
        }

        let config = self.read()?;
        Self::check(&config)?;
        Ok(config)
    }

    /// Parse the file without validating it
    pub fn read(&self) -> Result<TrackerConfig, ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate and write the configuration atomically
    pub fn save(&self, config: &TrackerConfig) -> Result<(), ConfigError> {
        Self::check(config)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(config)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }

    /// Write the default configuration unless a file already exists.
    /// Returns whether a file was created.
    pub fn initialize(&self) -> Result<bool, ConfigError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&TrackerConfig::default())?;
        Ok(true)
    }

    fn check(config: &TrackerConfig) -> Result<(), ConfigError> {
        let validator = ConfigValidator::new();
        let results = validator.validate(config);
        for warning in results.iter().filter(|r| !r.is_error()) {
            warn!(field = warning.field, "{}", warning.message);
        }

        let errors: Vec<_> = results.into_iter().filter(ValidationResult::is_error).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

impl Default for ConfigPersistence {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let persistence = ConfigPersistence::new(dir.path().join("absent.toml"));
        assert_eq!(persistence.load().unwrap(), TrackerConfig::default());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = TempDir::new().unwrap();
        let persistence = ConfigPersistence::new(dir.path().join("nested").join("config.toml"));

        let mut config = TrackerConfig::default();
        config.tracker.close_recheck_delay_ms = 150;
        config.description.fallback = "Unknown".to_string();
        persistence.save(&config).unwrap();

        assert_eq!(persistence.load().unwrap(), config);
        assert!(!persistence.path().with_extension("tmp").exists());
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracker]\nclose_recheck_delay_ms = 0\n").unwrap();

        let error = ConfigPersistence::new(&path).load().unwrap_err();
        assert!(matches!(error, ConfigError::Validation(_)));
        assert!(error.to_string().contains("close_recheck_delay_ms"));
    }

    #[test]
    fn initialize_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let persistence = ConfigPersistence::new(dir.path().join("config.toml"));
        assert!(persistence.initialize().unwrap());
        assert!(!persistence.initialize().unwrap());
    }
}
