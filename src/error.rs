use thiserror::Error;

/// Failure taxonomy shared by every collection, the coordinator and the sync layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Id-based lookup missed (pantry item, recipe, list, household by code)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation clashes with existing state (slot taken, already a member)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller lacks the right to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote document store or directory could not be reached
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// AI or catalog payload did not have the expected shape
    #[error("Upstream response malformed: {0}")]
    UpstreamMalformed(String),

    /// Camera or microphone missing or permission denied
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Local snapshot could not be read or written
    #[error("Local store error: {0}")]
    LocalStore(String),
}

impl AppError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn remote(err: anyhow::Error) -> Self {
        Self::RemoteUnavailable(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("set users/42");
        let msg = AppError::remote(err).to_string();
        assert!(msg.contains("set users/42"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn not_found_formats_subject() {
        assert_eq!(
            AppError::not_found("pantry item abc").to_string(),
            "Not found: pantry item abc"
        );
    }
}
