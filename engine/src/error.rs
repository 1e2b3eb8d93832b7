//! Error taxonomy for the casting/tally core.

use ballot_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("voting is not allowed at this time")]
    VotingClosed,

    #[error("voter has already voted in this election")]
    AlreadyVoted,

    #[error("candidate not found or not active")]
    CandidateNotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage operation timed out")]
    StorageTimeout,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl EngineError {
    /// Stable machine-readable kind, carried alongside the human message
    /// on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::VotingClosed => "voting_closed",
            Self::AlreadyVoted => "already_voted",
            Self::CandidateNotFound => "candidate_not_found",
            Self::Conflict(_) => "conflict",
            Self::InvalidInput(_) => "invalid_input",
            Self::StorageTimeout => "storage_timeout",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

/// Blanket conversion for plumbing paths.
///
/// `StoreError::Duplicate` from the casting path is never converted this
/// way — [`crate::CastingEngine`] maps it contextually to `AlreadyVoted`
/// or `Conflict` before this impl can see it.
impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            StoreError::Duplicate(what) => EngineError::Conflict(what),
            StoreError::Timeout(_) => EngineError::StorageTimeout,
            StoreError::Backend(msg)
            | StoreError::Serialization(msg)
            | StoreError::Corruption(msg) => EngineError::StorageUnavailable(msg),
        }
    }
}
