//! Configuration errors and the validation trait shared by all config types.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A field holds a value that makes no sense for it.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A numeric field lies outside its allowed range.
    #[error("'{field}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field.
        field: String,
        /// The rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validation for configuration value objects.
///
/// Implementors provide [`ConfigValidator::validate`]; the helper methods
/// cover the checks most fields need.
pub trait ConfigValidator {
    /// Checks every field, returning the first violation found.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Checks that `value` lies in `[min, max]` and is finite.
    fn validate_range(
        &self,
        field: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ConfigError> {
        if !value.is_finite() || value < min || value > max {
            return Err(ConfigError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Checks that a ratio lies strictly inside `(0, 1]`.
    fn validate_ratio(&self, field: &str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: field.to_string(),
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }

    /// Checks that a count is non-zero.
    fn validate_positive(&self, field: &str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::invalid(field, "must be greater than zero"));
        }
        Ok(())
    }
}
