//! Failure taxonomy shared by the proxy, the services and the HTTP layer.

use crate::infrastructure::repositories::RepositoryError;
use thiserror::Error;

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "AI credits exhausted. Please add credits to continue.";

#[derive(Debug, Error)]
pub enum CompanionError {
    /// Rejected before any network or store access.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,

    #[error("{}", QUOTA_EXHAUSTED_MESSAGE)]
    QuotaExhausted,

    #[error("{0}")]
    Upstream(String),

    #[error("AI Gateway did not respond within {0} seconds")]
    Timeout(u64),

    #[error("failed to access stored records: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("you must be signed in to do this")]
    AuthRequired,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CompanionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CompanionError::InvalidInput(message.into())
    }

    /// True for the failures that come from the completion gateway.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CompanionError::RateLimited
                | CompanionError::QuotaExhausted
                | CompanionError::Upstream(_)
                | CompanionError::Timeout(_)
        )
    }
}
