use thiserror::Error;

use super::types::Outcome;

/// Errors returned by [`super::UserStore`] operations. The display text is the
/// message shown to the player.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Username already exists!")]
    Duplicate,
    #[error("User not found!")]
    NotFound,
    #[error("No user is logged in!")]
    NoSession,
    #[error("Points total is too large!")]
    PointsOverflow,
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<serde_json::Error> for UserStoreError {
    fn from(err: serde_json::Error) -> Self {
        UserStoreError::Storage(err.into())
    }
}

impl Outcome {
    /// Flattens an operation result into the `{success, message}` shape,
    /// using `success_message` when the operation went through.
    pub fn from_result<T>(result: &Result<T, UserStoreError>, success_message: &str) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                message: success_message.to_string(),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}
