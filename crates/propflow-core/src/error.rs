//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// I/O error reading the config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required credential environment variable is missing
    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential {
        /// Name of the missing variable
        var: &'static str,
    },

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingCredential {
            var: "PROPFLOW_USERNAME",
        };
        assert_eq!(
            err.to_string(),
            "missing credential: environment variable PROPFLOW_USERNAME is not set"
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "run.saved_searches".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert!(err.to_string().contains("run.saved_searches"));
    }
}
