//! Abstract storage traits for the ballot platform.
//!
//! Every storage backend (LMDB for production, in-memory for testing)
//! implements these traits. The engine and RPC layers depend only on the
//! traits. Uniqueness guarantees — one vote per (voter, election), unique
//! receipt hashes, unique voter email/national id, unique candidate number
//! per election — are enforced by the backend, not merely checked by
//! callers.

pub mod candidate;
pub mod election;
pub mod error;
pub mod memory;
pub mod session;
pub mod vote;
pub mod voter;

pub use candidate::{CandidateRecord, CandidateStore};
pub use election::{ElectionRecord, ElectionStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use session::{SessionRecord, SessionStore};
pub use vote::{VoteRecord, VoteStore};
pub use voter::{VoterPage, VoterQuery, VoterRecord, VoterStore};

/// The full storage surface required by the engine.
///
/// Backends implement the per-concern traits; anything that implements all
/// of them (and is shareable across request handlers) is a `BallotStore`.
pub trait BallotStore:
    VoterStore + ElectionStore + CandidateStore + VoteStore + SessionStore + Send + Sync
{
}

impl<T> BallotStore for T where
    T: VoterStore + ElectionStore + CandidateStore + VoteStore + SessionStore + Send + Sync
{
}
