//! Configuration management for wintrack

pub mod persistence;
pub mod settings;
pub mod validator;

pub use persistence::{ConfigError, ConfigPersistence};
pub use settings::{DescriptionSettings, TrackerConfig, TrackerSettings};
pub use validator::{ConfigValidator, ValidationResult, ValidationSeverity};
