use std::fmt;

/// Result type for Vantage operations
pub type Result<T> = std::result::Result<T, VantageError>;

/// Main error type for the Vantage library
#[derive(Debug, Clone)]
pub enum VantageError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Two networks (or a network and a parameter set) do not share a layout
    ArchitectureMismatch(String),

    /// Action outside of the action space
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Environment contract violation or failure
    Environment(String),

    /// Agent contract violation or failure
    Agent(String),

    /// Numerical computation errors
    NumericalError(String),

    /// Training error
    TrainingError(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for VantageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VantageError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            VantageError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            VantageError::ArchitectureMismatch(msg) => write!(f, "Architecture mismatch: {}", msg),
            VantageError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            VantageError::Environment(msg) => write!(f, "Environment error: {}", msg),
            VantageError::Agent(msg) => write!(f, "Agent error: {}", msg),
            VantageError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            VantageError::TrainingError(msg) => write!(f, "Training error: {}", msg),
            VantageError::IoError(msg) => write!(f, "IO error: {}", msg),
            VantageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for VantageError {}

impl From<std::io::Error> for VantageError {
    fn from(err: std::io::Error) -> Self {
        VantageError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for VantageError {
    fn from(err: bincode::Error) -> Self {
        VantageError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for VantageError {
    fn from(err: serde_json::Error) -> Self {
        VantageError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl VantageError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        VantageError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        VantageError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
