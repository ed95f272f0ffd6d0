//! Shared error type across mixgate crates.

use thiserror::Error;

use crate::status::{Code, Status};

/// Shared result type.
pub type Result<T> = std::result::Result<T, MixError>;

/// Unified error type used by core and control.
#[derive(Debug, Error)]
pub enum MixError {
    #[error("global word index is too big: {index} >= {len}")]
    GlobalWordIndex { index: i32, len: usize },
    #[error("per message word index is too big: {index} >= {len}")]
    MessageWordIndex { index: usize, len: usize },
    #[error("REGEX condition is not supported (attribute {0})")]
    UnsupportedRegex(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MixError {
    /// Map an internal error to a stable status code.
    pub fn code(&self) -> Code {
        match self {
            MixError::GlobalWordIndex { .. }
            | MixError::MessageWordIndex { .. }
            | MixError::UnsupportedRegex(_) => Code::FailedPrecondition,
            MixError::InvalidConfig(_) | MixError::BadRequest(_) => Code::InvalidArgument,
            MixError::Internal(_) => Code::Internal,
        }
    }

    /// True for errors caused by a malformed referenced-attributes hint.
    pub fn is_malformed_hint(&self) -> bool {
        matches!(
            self,
            MixError::GlobalWordIndex { .. }
                | MixError::MessageWordIndex { .. }
                | MixError::UnsupportedRegex(_)
        )
    }
}

impl From<MixError> for Status {
    fn from(e: MixError) -> Self {
        Status::new(e.code(), e.to_string())
    }
}
