//! Vote casting, verification, and tallying core.
//!
//! Components, in dependency order:
//! - [`IdentityGate`] — resolves a bearer token to a voter and enforces
//!   the verified/admin capability checks.
//! - [`window`] — decides whether an election currently admits votes
//!   (admin-set status AND published time window, independently).
//! - [`CastingEngine`] — the one-vote-per-election casting path with the
//!   atomic record-and-increment effect.
//! - [`ReceiptService`] — anonymous receipt verification and
//!   caller-scoped vote status/history.
//! - [`ResultsAggregator`] — per-candidate tallies, percentages, and
//!   turnout statistics.
//! - [`Registry`] — registration and admin mutations (voter
//!   verification, election and candidate management).
//!
//! Every engine is a thin handle over an `Arc<S: BallotStore>`; all
//! durable invariants live in the store's constraint semantics.

pub mod casting;
pub mod error;
pub mod gate;
pub mod receipt;
pub mod registry;
pub mod tally;
pub mod window;

pub use casting::{CastingEngine, OriginMetadata, Receipt};
pub use error::EngineError;
pub use gate::IdentityGate;
pub use receipt::{ReceiptService, VerifiedVote, VoteHistoryEntry, VoteStatus};
pub use registry::{
    CandidateUpdate, ElectionDetail, NewCandidate, NewElection, NewVoter, Registry,
};
pub use tally::{
    CandidateResult, DashboardStats, ElectionResults, ElectionStatistics, RecentVote,
    ResultsAggregator,
};
