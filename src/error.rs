/// Unified error type for the speculator
/// Structured error handling with categories for the failure modes a host can act on
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// Parse errors: malformed trace line, unextractable literals
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        line: Option<String>,
    },

    /// IO errors: trace file access
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// Corruption errors: model state disagrees with the trace it was built from.
    /// The operand hot path panics on this instead; the variant exists for hosts
    /// that trap invariant reports at a boundary.
    #[error("Model corruption: {message}")]
    Corruption {
        message: String,
    },
}

impl ModelError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            line: None,
        }
    }

    pub fn parse_with_line(message: impl Into<String>, line: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            line: Some(line.into()),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for speculator operations
pub type ModelResult<T> = Result<T, ModelError>;
