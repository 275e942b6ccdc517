use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{field} must be >= 0, got {value}")]
    NegativeValue { field: String, value: f64 },
}

impl ProjectionError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable tag for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectionError::InvalidInput { .. } => "invalid-input",
            ProjectionError::NegativeValue { .. } => "negative-value",
        }
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
