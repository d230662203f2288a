use std::error::Error;
use std::fmt;

/// An error type indicating an invalid
/// configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The field must lie within a bounded range
    /// (probabilities in `[0, 1]`, finite non-negative
    /// coefficients and thresholds).
    OutOfRange { field: &'static str, value: f64 },
    /// The field must be strictly positive.
    NotPositive { field: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { field, value } => {
                write!(f, "configuration value {} = {} is out of range", field, value)
            }
            Self::NotPositive { field, value } => write!(
                f,
                "configuration value {} = {} must be positive",
                field, value
            ),
        }
    }
}

impl Error for ConfigError {}

/// Checks that `value` is a probability.
pub(crate) fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
        })
    }
}

/// Checks that `value` is finite and non-negative.
pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
        })
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field,
            value: value as f64,
        })
    }
}
