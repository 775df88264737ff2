//! Domain-specific error types for insight-atlas

use thiserror::Error;

/// Error type for the fallible edges of the pipeline: configuration, table
/// loading and the narrative rewrite call. Scoring itself never fails.
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Rewriting service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed rewrite response: {message}")]
    MalformedResponse { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for AtlasError {
    fn from(err: anyhow::Error) -> Self {
        AtlasError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(err: serde_json::Error) -> Self {
        AtlasError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AtlasError {
    fn from(err: toml::de::Error) -> Self {
        AtlasError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AtlasError {
    fn from(err: std::io::Error) -> Self {
        AtlasError::Config {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AtlasError {
    fn from(err: reqwest::Error) -> Self {
        AtlasError::Http {
            message: err.to_string(),
        }
    }
}

/// Result type alias for insight-atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_errors_map_to_serialization() {
        let err: AtlasError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, AtlasError::Serialization { .. }));
    }

    #[test]
    fn timeout_message_names_operation() {
        let err = AtlasError::Timeout {
            operation: "narrative rewrite".into(),
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Timeout error: narrative rewrite timed out after 250ms"
        );
    }
}
