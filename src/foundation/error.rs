/// Convenience result type used across the crate.
pub type RenderResult<T> = Result<T, RenderError>;

/// Top-level error taxonomy used by layout and dispatch APIs.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A required identifier (choir id, song id or definition key) was absent.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Invalid input data, or a collaborator broke its contract.
    #[error("validation error: {0}")]
    Validation(String),

    /// A row job was not accepted by the job transport.
    #[error("submission error: {0}")]
    Submission(String),

    /// Reading or writing a persisted object failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Errors when serializing or deserializing definitions and payloads.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    /// Build a [`RenderError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RenderError::Submission`] value.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Build a [`RenderError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`RenderError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error is an expected, caller-recoverable condition.
    ///
    /// Expected conditions are reported as a non-ok response rather than raised.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::MissingParameter(_))
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
