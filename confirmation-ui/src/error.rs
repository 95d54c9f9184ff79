//! Error handling for the confirmation UI agent.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfirmationUiError {
    #[error("no transactions provided for confirmation")]
    EmptyBatch,
    #[error("json error: {0}")]
    Json(String),
    #[error("user cancelled")]
    UserCancelled,
}

impl From<serde_json::Error> for ConfirmationUiError {
    fn from(e: serde_json::Error) -> Self {
        ConfirmationUiError::Json(e.to_string())
    }
}

impl ConfirmationUiError {
    pub fn scrubbed(&self) -> String {
        kdm::error::scrub_error_message(&self.to_string())
    }
}

pub type ConfirmationUiResult<T> = Result<T, ConfirmationUiError>;
