use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Description used when the owning process cannot be inspected
pub const DEFAULT_FALLBACK_DESCRIPTION: &str = "Administrator Window";

/// Full wintrack configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub tracker: TrackerSettings,
    pub description: DescriptionSettings,
}

/// Behaviour of the lifecycle tracker itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Wait between a destroy notification and the validity re-check
    pub close_recheck_delay_ms: u64,
    /// Run the cold-start scan before processing incremental events
    pub scan_on_start: bool,
    /// Attach a process description to maximize transitions
    pub describe_maximized: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            close_recheck_delay_ms: 100,
            scan_on_start: true,
            describe_maximized: true,
        }
    }
}

impl TrackerSettings {
    pub fn close_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.close_recheck_delay_ms)
    }
}

/// How window descriptions are derived from the owning process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionSettings {
    pub fallback: String,
    /// Longest main-window title still preferred over the file description
    pub max_title_len: usize,
}

impl Default for DescriptionSettings {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK_DESCRIPTION.to_string(),
            max_title_len: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TrackerConfig::default();
        assert_eq!(config.tracker.close_recheck_delay(), Duration::from_millis(100));
        assert!(config.tracker.scan_on_start);
        assert_eq!(config.description.fallback, "Administrator Window");
        assert_eq!(config.description.max_title_len, 30);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: TrackerConfig = toml::from_str(
            r#"
            [tracker]
            close_recheck_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.tracker.close_recheck_delay_ms, 250);
        assert!(config.tracker.describe_maximized);
        assert_eq!(config.description, DescriptionSettings::default());
    }
}
