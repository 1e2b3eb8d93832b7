//! The vote casting path.
//!
//! Precondition order is fixed and observable through the error returned:
//! election existence, then the voting window, then the one-vote check,
//! then candidate validity. The durable effect itself (vote row, counter
//! increment, `has_voted` flag) is a single store transaction, so a
//! concurrent double cast that slips past the read-side check still
//! loses at the constraint and is reported as `AlreadyVoted`.

use std::sync::Arc;

use ballot_store::vote::VoteRecord;
use ballot_store::{BallotStore, StoreError};
use ballot_types::{CandidateId, ElectionId, ReceiptHash, TimestampMs, VoterId};
use serde::Serialize;

use crate::error::EngineError;
use crate::receipt::compute_receipt_hash;
use crate::window;

/// Request-origin facts recorded with the vote for the audit trail.
#[derive(Clone, Debug, Default)]
pub struct OriginMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// What the voter takes away from a successful cast.
#[derive(Clone, Debug, Serialize)]
pub struct Receipt {
    pub vote_hash: ReceiptHash,
    pub cast_at: TimestampMs,
}

pub struct CastingEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for CastingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BallotStore> CastingEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Cast the voter's single vote in an election.
    ///
    /// The caller has already authenticated the voter and checked the
    /// verification flag; this path enforces everything about the
    /// election and the ballot itself.
    pub fn cast_vote(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
        candidate_id: CandidateId,
        origin: OriginMetadata,
        now: TimestampMs,
    ) -> Result<Receipt, EngineError> {
        let election = self.store.get_election(election_id)?;
        window::ensure_open(&election, now)?;

        if self.store.get_vote(voter_id, election_id)?.is_some() {
            return Err(EngineError::AlreadyVoted);
        }

        let candidate = match self.store.get_candidate(candidate_id) {
            Ok(c) => c,
            Err(StoreError::NotFound(_)) => return Err(EngineError::CandidateNotFound),
            Err(e) => return Err(e.into()),
        };
        if candidate.election_id != election_id || !candidate.is_active {
            return Err(EngineError::CandidateNotFound);
        }

        let hash = compute_receipt_hash(voter_id, candidate_id, election_id, now);
        let vote = VoteRecord {
            voter_id,
            candidate_id,
            election_id,
            hash,
            cast_at: now,
            ip_address: origin.ip_address,
            user_agent: origin.user_agent,
        };

        match self.store.cast(&vote) {
            Ok(()) => {
                tracing::info!(%election_id, %hash, "vote cast");
                Ok(Receipt {
                    vote_hash: hash,
                    cast_at: now,
                })
            }
            // The constraint fired after our read-side check: either a
            // concurrent cast by the same voter won the race, or (far
            // less likely) the hash collided with an existing vote.
            Err(StoreError::Duplicate(_)) => {
                if self.store.get_vote(voter_id, election_id)?.is_some() {
                    Err(EngineError::AlreadyVoted)
                } else {
                    Err(EngineError::Conflict("receipt hash collision".to_string()))
                }
            }
            Err(StoreError::NotFound(_)) => Err(EngineError::CandidateNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_store::candidate::{CandidateRecord, CandidateStore};
    use ballot_store::election::{ElectionRecord, ElectionStore};
    use ballot_store::voter::{VoterRecord, VoterStore};
    use ballot_store::vote::VoteStore;
    use ballot_store::MemoryStore;
    use ballot_types::{ElectionStatus, VoterRole};

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_voter(&VoterRecord {
                id: VoterId::new(1),
                email: "v@example.org".to_string(),
                full_name: "V".to_string(),
                national_id: "1234567890123456".to_string(),
                date_of_birth: "1990-01-01".to_string(),
                address: "a".to_string(),
                phone: "0800".to_string(),
                role: VoterRole::Voter,
                is_verified: true,
                has_voted: false,
                registered_at: TimestampMs::EPOCH,
                last_login: None,
            })
            .unwrap();
        store
            .put_election(&ElectionRecord {
                id: ElectionId::new(1),
                title: "General".to_string(),
                description: None,
                start_date: TimestampMs::new(1_000),
                end_date: TimestampMs::new(2_000),
                status: ElectionStatus::Active,
                is_active: true,
                max_votes_per_user: 1,
                created_at: TimestampMs::EPOCH,
            })
            .unwrap();
        store
            .put_candidate(&CandidateRecord {
                id: CandidateId::new(10),
                election_id: ElectionId::new(1),
                name: "Alice".to_string(),
                party: None,
                description: None,
                photo_url: None,
                candidate_number: 1,
                vote_count: 0,
                is_active: true,
            })
            .unwrap();
        store
    }

    fn engine(store: &Arc<MemoryStore>) -> CastingEngine<MemoryStore> {
        CastingEngine::new(Arc::clone(store))
    }

    #[test]
    fn successful_cast_returns_receipt_and_increments() {
        let store = seeded_store();
        let receipt = engine(&store)
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(1),
                CandidateId::new(10),
                OriginMetadata::default(),
                TimestampMs::new(1_500),
            )
            .unwrap();
        assert_eq!(receipt.cast_at, TimestampMs::new(1_500));
        assert_eq!(store.get_candidate(CandidateId::new(10)).unwrap().vote_count, 1);
        assert!(store.get_voter(VoterId::new(1)).unwrap().has_voted);
        let stored = store
            .get_vote_by_hash(&receipt.vote_hash)
            .unwrap()
            .expect("vote stored under receipt hash");
        assert_eq!(stored.voter_id, VoterId::new(1));
    }

    #[test]
    fn second_cast_is_already_voted() {
        let store = seeded_store();
        let eng = engine(&store);
        eng.cast_vote(
            VoterId::new(1),
            ElectionId::new(1),
            CandidateId::new(10),
            OriginMetadata::default(),
            TimestampMs::new(1_500),
        )
        .unwrap();
        let err = eng
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(1),
                CandidateId::new(10),
                OriginMetadata::default(),
                TimestampMs::new(1_600),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyVoted));
        assert_eq!(store.get_candidate(CandidateId::new(10)).unwrap().vote_count, 1);
    }

    #[test]
    fn closed_window_rejected_before_ballot_checks() {
        let store = seeded_store();
        let err = engine(&store)
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(1),
                CandidateId::new(999),
                OriginMetadata::default(),
                TimestampMs::new(2_001),
            )
            .unwrap_err();
        // Window failure wins over the bogus candidate id.
        assert!(matches!(err, EngineError::VotingClosed));
    }

    #[test]
    fn missing_election_is_not_found() {
        let store = seeded_store();
        let err = engine(&store)
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(42),
                CandidateId::new(10),
                OriginMetadata::default(),
                TimestampMs::new(1_500),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn candidate_from_other_election_rejected() {
        let store = seeded_store();
        store
            .put_election(&ElectionRecord {
                id: ElectionId::new(2),
                title: "Other".to_string(),
                description: None,
                start_date: TimestampMs::new(1_000),
                end_date: TimestampMs::new(2_000),
                status: ElectionStatus::Active,
                is_active: true,
                max_votes_per_user: 1,
                created_at: TimestampMs::EPOCH,
            })
            .unwrap();
        let err = engine(&store)
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(2),
                CandidateId::new(10),
                OriginMetadata::default(),
                TimestampMs::new(1_500),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::CandidateNotFound));
    }

    #[test]
    fn inactive_candidate_rejected() {
        let store = seeded_store();
        let mut candidate = store.get_candidate(CandidateId::new(10)).unwrap();
        candidate.is_active = false;
        store.put_candidate(&candidate).unwrap();
        let err = engine(&store)
            .cast_vote(
                VoterId::new(1),
                ElectionId::new(1),
                CandidateId::new(10),
                OriginMetadata::default(),
                TimestampMs::new(1_500),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::CandidateNotFound));
    }
}
