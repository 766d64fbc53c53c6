use thiserror::Error;

/// Message carried by every division-by-zero failure
pub const DIVIDE_BY_ZERO_MESSAGE: &str = "divide by zero";

/// Error types for calculator operations and the tooling around them
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("divide by zero")]
    DivisionByZero,

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("Cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Unknown operation: '{input}'")]
    UnknownOperation { input: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge { path: String, size: u64, max_size: u64 },

    #[error("Canonicalization failed for path '{path}': {source}")]
    Canonicalization { path: String, source: std::io::Error },

    #[error("Path traversal detected: '{path}' is outside root '{root}'")]
    PathTraversal { path: String, root: String },

    #[error("Parallel processing error: {message}")]
    ParallelProcessing { message: String },

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("XML serialization error: {0}")]
    XmlSerialization(#[from] quick_xml::DeError),
}

impl CalculatorError {
    /// True for failures produced by the arithmetic itself rather than by
    /// input handling, configuration or IO.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            CalculatorError::DivisionByZero | CalculatorError::InvalidArgument { .. }
        )
    }
}

/// Result type alias for calculator operations
pub type CalculatorResult<T> = Result<T, CalculatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero_message_is_stable() {
        assert_eq!(CalculatorError::DivisionByZero.to_string(), DIVIDE_BY_ZERO_MESSAGE);
    }

    #[test]
    fn test_is_arithmetic() {
        assert!(CalculatorError::DivisionByZero.is_arithmetic());
        assert!(CalculatorError::InvalidArgument { message: "bad".to_string() }.is_arithmetic());
        assert!(!CalculatorError::UnknownOperation { input: "mul 1 2".to_string() }.is_arithmetic());
        assert!(!CalculatorError::InvalidConfig { message: "empty".to_string() }.is_arithmetic());
    }
}
