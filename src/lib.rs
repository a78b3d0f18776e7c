//! wintrack - Window Lifecycle Tracker
//!
//! wintrack listens to low-level window notifications and reduces them to a
//! handful of deduplicated lifecycle transitions per top-level window:
//! float, maximize, unmaximize, minimize and close.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod platform;
pub mod services;

pub use models::*;
pub use services::*;

/// Result type alias for wintrack operations
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to wintrack operations
#[derive(thiserror::Error, Debug)]
pub enum WinTrackError {
    #[error("Failed to register {kind} hook: {reason}")]
    HookRegistration { kind: RawEventKind, reason: String },

    #[error("Hook not found: {0}")]
    HookNotFound(u64),

    #[error("Platform API error: {0}")]
    Platform(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Process lookup failed for window {handle}: {reason}")]
    ProcessLookup { handle: WindowHandle, reason: String },
}
