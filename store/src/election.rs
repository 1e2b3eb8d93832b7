//! Election storage trait.

use crate::StoreError;
use ballot_types::{ElectionId, ElectionStatus, TimestampMs};
use serde::{Deserialize, Serialize};

/// A named ballot event with a published voting window.
///
/// Invariant at creation: `end_date > start_date`. The status label is
/// admin-driven; the window is checked independently when admitting votes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectionRecord {
    pub id: ElectionId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: TimestampMs,
    pub end_date: TimestampMs,
    pub status: ElectionStatus,
    /// Soft flag; disabled elections are hidden from public listings.
    pub is_active: bool,
    /// Maximum selections per voter. Observed as 1 in practice; the
    /// one-vote-per-election constraint is enforced regardless.
    pub max_votes_per_user: u32,
    pub created_at: TimestampMs,
}

/// Trait for election storage operations.
pub trait ElectionStore {
    /// Reserve the next election id from the backend's sequence.
    fn allocate_election_id(&self) -> Result<ElectionId, StoreError>;

    fn put_election(&self, election: &ElectionRecord) -> Result<(), StoreError>;

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError>;

    /// All elections, newest first.
    fn list_elections(&self) -> Result<Vec<ElectionRecord>, StoreError>;

    fn election_count(&self) -> Result<u64, StoreError>;

    fn active_election_count(&self) -> Result<u64, StoreError>;
}
