//! Task-level errors.

use coach_providers::DispatchError;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Dispatch failed or the model output could not be parsed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The caller's input was rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model answered, but nothing usable survived validation.
    #[error("model returned no usable {0}")]
    EmptyResult(&'static str),
}

impl TaskError {
    /// Quota exhaustion: the UI should suggest waiting before a retry.
    pub fn is_quota(&self) -> bool {
        matches!(self, TaskError::Dispatch(e) if e.is_quota())
    }

    /// Retries ran out on a temporary condition; trying later may work.
    pub fn is_transient(&self) -> bool {
        matches!(self, TaskError::Dispatch(e) if e.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_flag_passes_through() {
        let err = TaskError::from(DispatchError::QuotaExceeded {
            attempts: 5,
            message: "quota".into(),
        });
        assert!(err.is_quota());
        assert!(err.is_transient());
        assert!(!TaskError::InvalidInput("x".into()).is_transient());
        assert!(!TaskError::EmptyResult("questions").is_quota());
        assert_eq!(
            TaskError::EmptyResult("questions").to_string(),
            "model returned no usable questions"
        );
    }
}
