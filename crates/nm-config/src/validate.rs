//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::analyzer::AnalyzerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Smallest window from which a slope can be estimated.
pub const MIN_WINDOW_SIZE: usize = 2;

/// Smallest sample count for which a quadratic fit is determined.
pub const MIN_CLASSIFICATION_POINTS: usize = 3;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Name of the offending field, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            ValidationError::VersionMismatch { .. } => None,
        }
    }
}

/// Validate analyzer configuration semantically.
pub fn validate_analyzer(config: &AnalyzerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.window_size < MIN_WINDOW_SIZE {
        return Err(ValidationError::invalid(
            "window_size",
            format!("Must be at least {}, got {}", MIN_WINDOW_SIZE, config.window_size),
        ));
    }

    validate_non_negative("absolute_noise_floor", config.absolute_noise_floor)?;
    validate_non_negative("relative_noise_fraction", config.relative_noise_fraction)?;

    if config.min_points_for_classification < MIN_CLASSIFICATION_POINTS {
        return Err(ValidationError::invalid(
            "min_points_for_classification",
            format!(
                "Must be at least {} (a quadratic needs three points), got {}",
                MIN_CLASSIFICATION_POINTS, config.min_points_for_classification
            ),
        ));
    }
    if config.min_points_for_classification > config.window_size {
        return Err(ValidationError::invalid(
            "min_points_for_classification",
            format!(
                "Must not exceed window_size ({}), got {}",
                config.window_size, config.min_points_for_classification
            ),
        ));
    }

    if !config.small_sample_noise_multiplier.is_finite()
        || config.small_sample_noise_multiplier < 1.0
    {
        return Err(ValidationError::invalid(
            "small_sample_noise_multiplier",
            format!(
                "Must be finite and at least 1.0, got {}",
                config.small_sample_noise_multiplier
            ),
        ));
    }

    validate_positive("alerts.critical_days", config.alerts.critical_days)?;
    validate_positive("alerts.warning_days", config.alerts.warning_days)?;
    if config.alerts.warning_days < config.alerts.critical_days {
        return Err(ValidationError::invalid(
            "alerts.warning_days",
            format!(
                "Must be at least critical_days ({}), got {}",
                config.alerts.critical_days, config.alerts.warning_days
            ),
        ));
    }

    validate_positive("horizons.short_days", config.horizons.short_days)?;
    validate_positive("horizons.long_days", config.horizons.long_days)?;

    Ok(())
}

fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("Must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("Must be finite and positive, got {}", value),
        ));
    }
    Ok(())
}
