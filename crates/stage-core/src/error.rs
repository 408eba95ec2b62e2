//! Error types for Stage

use thiserror::Error;

/// The main error type for Stage operations
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Scene error: {0}")]
    SceneError(String),

    #[error("Invalid enum value: {value} is not one of {allowed:?}")]
    InvalidEnumValue { value: String, allowed: Vec<String> },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Invalid viewport size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },

    #[error("Player has been disposed")]
    Disposed,
}

/// Result type alias for Stage operations
pub type Result<T> = std::result::Result<T, StageError>;

impl From<serde_json::Error> for StageError {
    fn from(err: serde_json::Error) -> Self {
        StageError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for StageError {
    fn from(err: toml::de::Error) -> Self {
        StageError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let err: StageError = serde_json::from_str::<serde_json::Value>("{ nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, StageError::JsonError(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn test_invalid_size_display() {
        let err = StageError::InvalidSize {
            width: 0.0,
            height: 600.0,
        };
        assert_eq!(err.to_string(), "Invalid viewport size: 0x600");
    }
}
