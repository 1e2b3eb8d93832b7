//! Candidate storage trait.

use crate::StoreError;
use ballot_types::{CandidateId, ElectionId};
use serde::{Deserialize, Serialize};

/// A selectable option within one election.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub election_id: ElectionId,
    pub name: String,
    pub party: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    /// Display number, unique within the election across active and
    /// inactive candidates alike.
    pub candidate_number: u32,
    /// Derived aggregate, kept consistent with the vote log by the
    /// backend's atomic cast transaction.
    pub vote_count: u64,
    /// Soft-delete flag; inactive candidates cannot receive votes but
    /// still occupy their candidate number.
    pub is_active: bool,
}

/// Trait for candidate storage operations.
pub trait CandidateStore {
    /// Reserve the next candidate id from the backend's sequence.
    fn allocate_candidate_id(&self) -> Result<CandidateId, StoreError>;

    /// Insert or update a candidate.
    ///
    /// Fails with [`StoreError::Duplicate`] when `candidate_number` is
    /// already held by a different candidate of the same election,
    /// whether or not that candidate is active.
    fn put_candidate(&self, candidate: &CandidateRecord) -> Result<(), StoreError>;

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError>;

    /// All candidates of an election, ordered by candidate number.
    fn candidates_for_election(
        &self,
        election_id: ElectionId,
    ) -> Result<Vec<CandidateRecord>, StoreError>;
}
