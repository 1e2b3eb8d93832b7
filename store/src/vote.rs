//! Vote storage trait.
//!
//! Votes are the append-only audit log of the system: no update or delete
//! operation exists. The `(voter, election)` pair is the primary key, so
//! the one-vote-per-election invariant is a storage constraint, not an
//! application-level promise.

use crate::StoreError;
use ballot_types::{CandidateId, ElectionId, ReceiptHash, TimestampMs, VoterId};
use serde::{Deserialize, Serialize};

/// An immutable record of one cast vote.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    pub election_id: ElectionId,
    /// Globally unique receipt hash, the anonymous verification handle.
    pub hash: ReceiptHash,
    pub cast_at: TimestampMs,
    /// Origin address of the casting request, for the audit trail.
    pub ip_address: Option<String>,
    /// Client string of the casting request, for the audit trail.
    pub user_agent: Option<String>,
}

/// Trait for vote storage operations.
pub trait VoteStore {
    /// Record a vote atomically.
    ///
    /// In one backend transaction: verify no vote exists for
    /// `(voter_id, election_id)` and no vote carries the same hash, insert
    /// the vote, increment the candidate's vote counter by exactly one,
    /// and set the voter's `has_voted` flag. The loser of a concurrent
    /// double-cast race receives [`StoreError::Duplicate`]; partial
    /// effects are impossible.
    ///
    /// Fails with [`StoreError::NotFound`] when the referenced candidate
    /// or voter row is missing (callers validate these first; the
    /// transaction re-reads them so the counter can never drift).
    fn cast(&self, vote: &VoteRecord) -> Result<(), StoreError>;

    fn get_vote(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<VoteRecord>, StoreError>;

    fn get_vote_by_hash(&self, hash: &ReceiptHash) -> Result<Option<VoteRecord>, StoreError>;

    /// All votes cast in an election.
    fn votes_for_election(&self, election_id: ElectionId) -> Result<Vec<VoteRecord>, StoreError>;

    /// All votes cast by a voter, newest first.
    fn votes_by_voter(&self, voter_id: VoterId) -> Result<Vec<VoteRecord>, StoreError>;

    fn count_for_election(&self, election_id: ElectionId) -> Result<u64, StoreError>;

    fn total_vote_count(&self) -> Result<u64, StoreError>;

    /// The `limit` most recently cast votes across all elections,
    /// newest first.
    fn recent_votes(&self, limit: usize) -> Result<Vec<VoteRecord>, StoreError>;
}
