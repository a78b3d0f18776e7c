use crate::config::settings::TrackerConfig;

/// Upper bound for the close re-check delay; longer waits let stale handles
/// be reused by new windows before the check runs
const MAX_CLOSE_RECHECK_DELAY_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub field: &'static str,
    pub severity: ValidationSeverity,
    pub message: String,
}

impl ValidationResult {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: ValidationSeverity::Error,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: ValidationSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == ValidationSeverity::Error
    }
}

#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &TrackerConfig) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let delay = config.tracker.close_recheck_delay_ms;

        if delay == 0 {
            results.push(ValidationResult::error(
                "tracker.close_recheck_delay_ms",
                "Close re-check delay must be greater than zero",
            ));
        } else if delay > MAX_CLOSE_RECHECK_DELAY_MS {
            results.push(ValidationResult::error(
                "tracker.close_recheck_delay_ms",
                format!(
                    "Close re-check delay {}ms exceeds the {}ms limit",
                    delay, MAX_CLOSE_RECHECK_DELAY_MS
                ),
            ));
        } else if delay < 20 {
            results.push(ValidationResult::warning(
                "tracker.close_recheck_delay_ms",
                format!(
                    "Close re-check delay {}ms is short; closing windows may still look valid",
                    delay
                ),
            ));
        }

        if config.description.fallback.trim().is_empty() {
            results.push(ValidationResult::error(
                "description.fallback",
                "Fallback description cannot be empty",
            ));
        }

        if config.description.max_title_len == 0 {
            results.push(ValidationResult::error(
                "description.max_title_len",
                "Maximum title length must be at least 1",
            ));
        }

        results
    }

    pub fn errors(&self, config: &TrackerConfig) -> Vec<ValidationResult> {
        self.validate(config)
            .into_iter()
            .filter(ValidationResult::is_error)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_clean() {
        let validator = ConfigValidator::new();
        assert!(validator.validate(&TrackerConfig::default()).is_empty());
    }

    #[test]
    fn zero_delay_and_empty_fallback_are_errors() {
        let mut config = TrackerConfig::default();
        config.tracker.close_recheck_delay_ms = 0;
        config.description.fallback = "   ".to_string();

        let errors = ConfigValidator::new().errors(&config);
        let fields: Vec<_> = errors.iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec!["tracker.close_recheck_delay_ms", "description.fallback"]
        );
    }

    #[test]
    fn short_delay_only_warns() {
        let mut config = TrackerConfig::default();
        config.tracker.close_recheck_delay_ms = 5;

        let validator = ConfigValidator::new();
        let results = validator.validate(&config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, ValidationSeverity::Warning);
        assert!(validator.errors(&config).is_empty());
    }
}
