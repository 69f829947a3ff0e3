//! Configuration validation module.
//!
//! Validates every configuration value up front and reports all problems
//! at once.

use crate::{AdvisoryLockConfig, AppConfig, DatabaseConfig};
use bmm_core::TelemetryConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Sampling ratio must be between 0.0 and 1.0.
    InvalidSamplingRatio { value: f64 },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Advisory lock retry policy is unusable.
    InvalidRetryPolicy { message: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidSamplingRatio { value } => {
                write!(
                    f,
                    "Invalid sampling ratio: {} (must be between 0.0 and 1.0)",
                    value
                )
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::InvalidRetryPolicy { message } => {
                write!(f, "Invalid advisory lock retry policy: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Accepted database URL schemes.
    const DATABASE_SCHEMES: &'static [&'static str] = &["postgres", "postgresql"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_database(&config.database, &mut errors);
        Self::validate_advisory_lock(&config.database.advisory_lock, &mut errors);
        Self::validate_telemetry(&config.telemetry, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates database configuration.
    fn validate_database(config: &DatabaseConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else {
            match Url::parse(&config.url) {
                Ok(url) if Self::DATABASE_SCHEMES.contains(&url.scheme()) => {}
                Ok(url) => errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "database".to_string(),
                    message: format!(
                        "unsupported scheme '{}', expected postgres:// or postgresql://",
                        url.scheme()
                    ),
                }),
                Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "database".to_string(),
                    message: e.to_string(),
                }),
            }
        }

        if config.min_connections > config.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        for (name, value) in [
            ("database.connect_timeout_secs", config.connect_timeout_secs),
            ("database.idle_timeout_secs", config.idle_timeout_secs),
            ("database.lock_timeout_secs", config.lock_timeout_secs),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }

    /// Validates the advisory lock retry policy.
    fn validate_advisory_lock(config: &AdvisoryLockConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.max_attempts == 0 {
            errors.push(ConfigValidationError::InvalidRetryPolicy {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if config.multiplier < 1.0 {
            errors.push(ConfigValidationError::InvalidRetryPolicy {
                message: format!("multiplier must be >= 1.0, got {}", config.multiplier),
            });
        }
    }

    /// Validates telemetry configuration.
    fn validate_telemetry(config: &TelemetryConfig, errors: &mut Vec<ConfigValidationError>) {
        if !(0.0..=1.0).contains(&config.sampling_ratio) {
            errors.push(ConfigValidationError::InvalidSamplingRatio {
                value: config.sampling_ratio,
            });
        }

        if let Some(ref endpoint) = config.otlp_endpoint {
            if Url::parse(endpoint).is_err() {
                errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "otlp_endpoint".to_string(),
                    message: format!("Invalid URL format: {}", endpoint),
                });
            }
        }
    }
}

/// Formats validation errors for display.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
