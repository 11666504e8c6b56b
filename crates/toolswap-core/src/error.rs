//! Error handling for toolswap
//!
//! Provides the configuration error shared by every crate in the workspace:
//! dialect selection, parameter validation and script lookup.
//!
//! Configuration errors are always raised before a transform touches any layer.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Configuration error type
///
/// Represents a setting that cannot be used to build a transformer.
/// These are reported once, up front, and abort the whole post-processing pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The firmware dialect is not one of the recognized set
    #[error("Unsupported firmware dialect: {dialect}")]
    UnsupportedDialect {
        /// The dialect name that was requested.
        dialect: String,
    },

    /// A parameter value cannot be used
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        param: String,
        /// The reason the value is rejected.
        reason: String,
    },

    /// No post-processing script is known under this name
    #[error("Unknown post-processing script: {name}")]
    UnknownScript {
        /// The requested script name.
        name: String,
    },
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidParameter`] from any displayable reason
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Reject NaN and infinities for a named numeric setting
pub fn ensure_finite(param: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(param, format!("{} is not a finite number", value)))
    }
}

/// Like [`ensure_finite`], for settings that may be left unset
pub fn ensure_finite_opt(param: &str, value: Option<f64>) -> Result<Option<f64>, ConfigError> {
    value.map(|v| ensure_finite(param, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnsupportedDialect {
            dialect: "makerbot".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported firmware dialect: makerbot");

        let err = ConfigError::invalid("unload_amount", "must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'unload_amount': must be a number"
        );

        let err = ConfigError::UnknownScript {
            name: "purge".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown post-processing script: purge");
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("x", 1.5), Ok(1.5));
        assert!(ensure_finite("x", f64::NAN).is_err());
        assert!(ensure_finite("x", f64::INFINITY).is_err());
        assert_eq!(ensure_finite_opt("x", None), Ok(None));
        assert!(ensure_finite_opt("x", Some(f64::NEG_INFINITY)).is_err());
    }
}
