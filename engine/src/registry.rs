//! Registration and administrative mutations.
//!
//! Everything here is admin- or registration-facing: voter onboarding
//! and verification, election lifecycle, candidate management, and the
//! public election read surface. Capability checks (`require_admin`)
//! happen at the RPC boundary via the identity gate; this layer assumes
//! the caller is entitled and enforces data validity only.

use std::sync::Arc;

use ballot_store::candidate::CandidateRecord;
use ballot_store::election::ElectionRecord;
use ballot_store::voter::{VoterPage, VoterQuery, VoterRecord};
use ballot_store::{BallotStore, StoreError};
use ballot_types::{
    CandidateId, ElectionId, ElectionStatus, TimestampMs, VoterId, VoterRole,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::window;

/// Registration input. Role and verification are never caller-supplied:
/// every registration produces an unverified `Voter`.
#[derive(Clone, Debug, Deserialize)]
pub struct NewVoter {
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    pub date_of_birth: String,
    pub address: String,
    pub phone: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewElection {
    pub title: String,
    pub description: Option<String>,
    pub start_date: TimestampMs,
    pub end_date: TimestampMs,
    pub max_votes_per_user: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewCandidate {
    pub election_id: ElectionId,
    pub name: String,
    pub party: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub candidate_number: u32,
}

/// Partial candidate update; absent fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub party: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub candidate_number: Option<u32>,
    pub is_active: Option<bool>,
}

/// An election together with its selectable candidates.
#[derive(Clone, Debug, Serialize)]
pub struct ElectionDetail {
    #[serde(flatten)]
    pub election: ElectionRecord,
    pub candidates: Vec<CandidateRecord>,
}

pub struct Registry<S> {
    store: Arc<S>,
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

const NATIONAL_ID_DIGITS: usize = 16;

fn validate_new_voter(new: &NewVoter) -> Result<(), EngineError> {
    if new.full_name.trim().is_empty() {
        return Err(EngineError::InvalidInput("full name is required".to_string()));
    }
    if !new.email.contains('@') {
        return Err(EngineError::InvalidInput("invalid email address".to_string()));
    }
    if new.national_id.len() != NATIONAL_ID_DIGITS
        || !new.national_id.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(EngineError::InvalidInput(
            "national id must be 16 digits".to_string(),
        ));
    }
    Ok(())
}

impl<S: BallotStore> Registry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ---- voters ----

    /// Register a new voter identity. Unverified until an admin reviews it.
    pub fn register_voter(
        &self,
        new: NewVoter,
        now: TimestampMs,
    ) -> Result<VoterRecord, EngineError> {
        validate_new_voter(&new)?;
        if self.store.find_by_email(&new.email)?.is_some() {
            return Err(EngineError::Conflict("email already registered".to_string()));
        }
        if self.store.find_by_national_id(&new.national_id)?.is_some() {
            return Err(EngineError::Conflict(
                "national id already registered".to_string(),
            ));
        }
        let voter = VoterRecord {
            id: self.store.allocate_voter_id()?,
            email: new.email,
            full_name: new.full_name,
            national_id: new.national_id,
            date_of_birth: new.date_of_birth,
            address: new.address,
            phone: new.phone,
            role: VoterRole::Voter,
            is_verified: false,
            has_voted: false,
            registered_at: now,
            last_login: None,
        };
        match self.store.put_voter(&voter) {
            Ok(()) => {
                tracing::info!(voter_id = %voter.id, "voter registered");
                Ok(voter)
            }
            // Raced with another registration holding the same email or
            // national id.
            Err(StoreError::Duplicate(what)) => Err(EngineError::Conflict(what)),
            Err(e) => Err(e.into()),
        }
    }

    /// Admin action: mark a voter's identity as reviewed and verified.
    pub fn verify_voter(&self, voter_id: VoterId) -> Result<VoterRecord, EngineError> {
        let mut voter = self.store.get_voter(voter_id)?;
        voter.is_verified = true;
        self.store.put_voter(&voter)?;
        tracing::info!(%voter_id, "voter verified");
        Ok(voter)
    }

    /// Admin listing with search/verified filters and pagination.
    pub fn list_voters(&self, query: &VoterQuery) -> Result<VoterPage, EngineError> {
        Ok(self.store.list_voters(query)?)
    }

    // ---- elections ----

    /// Admin action: create an election. Status always starts `Upcoming`;
    /// opening it for votes is a separate, explicit transition.
    pub fn create_election(
        &self,
        new: NewElection,
        now: TimestampMs,
    ) -> Result<ElectionRecord, EngineError> {
        if new.title.trim().is_empty() {
            return Err(EngineError::InvalidInput("title is required".to_string()));
        }
        if new.end_date <= new.start_date {
            return Err(EngineError::InvalidInput(
                "end date must be after start date".to_string(),
            ));
        }
        let election = ElectionRecord {
            id: self.store.allocate_election_id()?,
            title: new.title,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            status: ElectionStatus::Upcoming,
            is_active: true,
            max_votes_per_user: new.max_votes_per_user.unwrap_or(1),
            created_at: now,
        };
        self.store.put_election(&election)?;
        tracing::info!(election_id = %election.id, title = %election.title, "election created");
        Ok(election)
    }

    /// Admin action: set the status label. Deliberately never derived
    /// from the clock.
    pub fn set_election_status(
        &self,
        election_id: ElectionId,
        status: ElectionStatus,
    ) -> Result<ElectionRecord, EngineError> {
        let mut election = self.store.get_election(election_id)?;
        election.status = status;
        self.store.put_election(&election)?;
        tracing::info!(%election_id, status = %status.as_str(), "election status changed");
        Ok(election)
    }

    /// Public listing: elections not soft-disabled, newest first.
    pub fn list_elections(&self) -> Result<Vec<ElectionRecord>, EngineError> {
        let elections = self.store.list_elections()?;
        Ok(elections.into_iter().filter(|e| e.is_active).collect())
    }

    /// Elections currently admitting votes: active status AND the window
    /// contains `now`, the same conjunction the casting path enforces.
    pub fn active_elections(&self, now: TimestampMs) -> Result<Vec<ElectionRecord>, EngineError> {
        let elections = self.store.list_elections()?;
        Ok(elections
            .into_iter()
            .filter(|e| e.is_active && window::is_open(e, now))
            .collect())
    }

    /// One election with its active candidates, ordered by number.
    pub fn election_detail(&self, election_id: ElectionId) -> Result<ElectionDetail, EngineError> {
        let election = self.store.get_election(election_id)?;
        let candidates = self
            .store
            .candidates_for_election(election_id)?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        Ok(ElectionDetail {
            election,
            candidates,
        })
    }

    // ---- candidates ----

    /// Admin action: add a candidate to an election.
    pub fn add_candidate(&self, new: NewCandidate) -> Result<CandidateRecord, EngineError> {
        if new.name.trim().is_empty() {
            return Err(EngineError::InvalidInput("name is required".to_string()));
        }
        // Surface a missing election as 404, not a dangling reference.
        self.store.get_election(new.election_id)?;
        let candidate = CandidateRecord {
            id: self.store.allocate_candidate_id()?,
            election_id: new.election_id,
            name: new.name,
            party: new.party,
            description: new.description,
            photo_url: new.photo_url,
            candidate_number: new.candidate_number,
            vote_count: 0,
            is_active: true,
        };
        match self.store.put_candidate(&candidate) {
            Ok(()) => {
                tracing::info!(candidate_id = %candidate.id, election_id = %candidate.election_id, "candidate added");
                Ok(candidate)
            }
            Err(StoreError::Duplicate(_)) => Err(EngineError::Conflict(
                "candidate number already taken in this election".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Admin action: update candidate fields. The number check excludes
    /// the candidate itself, so a no-op update is always accepted.
    pub fn update_candidate(
        &self,
        candidate_id: CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, EngineError> {
        let mut candidate = self.store.get_candidate(candidate_id)?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(EngineError::InvalidInput("name is required".to_string()));
            }
            candidate.name = name;
        }
        if let Some(party) = update.party {
            candidate.party = Some(party);
        }
        if let Some(description) = update.description {
            candidate.description = Some(description);
        }
        if let Some(photo_url) = update.photo_url {
            candidate.photo_url = Some(photo_url);
        }
        if let Some(number) = update.candidate_number {
            candidate.candidate_number = number;
        }
        if let Some(is_active) = update.is_active {
            candidate.is_active = is_active;
        }
        match self.store.put_candidate(&candidate) {
            Ok(()) => Ok(candidate),
            Err(StoreError::Duplicate(_)) => Err(EngineError::Conflict(
                "candidate number already taken in this election".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Admin action: soft-delete. The candidate keeps its number (still
    /// reserved) and its tally; it just stops being selectable.
    pub fn deactivate_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CandidateRecord, EngineError> {
        let mut candidate = self.store.get_candidate(candidate_id)?;
        candidate.is_active = false;
        self.store.put_candidate(&candidate)?;
        tracing::info!(%candidate_id, "candidate deactivated");
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_store::MemoryStore;

    fn registry() -> Registry<MemoryStore> {
        Registry::new(Arc::new(MemoryStore::new()))
    }

    fn new_voter(email: &str, nid: &str) -> NewVoter {
        NewVoter {
            email: email.to_string(),
            full_name: "Alice Smith".to_string(),
            national_id: nid.to_string(),
            date_of_birth: "1990-01-01".to_string(),
            address: "1 Main St".to_string(),
            phone: "0800000000".to_string(),
        }
    }

    fn new_election(start: u64, end: u64) -> NewElection {
        NewElection {
            title: "General".to_string(),
            description: None,
            start_date: TimestampMs::new(start),
            end_date: TimestampMs::new(end),
            max_votes_per_user: None,
        }
    }

    fn new_candidate(election_id: ElectionId, number: u32) -> NewCandidate {
        NewCandidate {
            election_id,
            name: format!("Candidate {number}"),
            party: None,
            description: None,
            photo_url: None,
            candidate_number: number,
        }
    }

    #[test]
    fn registration_starts_unverified_voter() {
        let reg = registry();
        let voter = reg
            .register_voter(
                new_voter("a@example.org", "1111222233334444"),
                TimestampMs::new(5),
            )
            .unwrap();
        assert!(!voter.is_verified);
        assert_eq!(voter.role, VoterRole::Voter);
        assert_eq!(voter.registered_at, TimestampMs::new(5));
    }

    #[test]
    fn registration_rejects_bad_input() {
        let reg = registry();
        let mut bad_email = new_voter("not-an-email", "1111222233334444");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            reg.register_voter(bad_email, TimestampMs::EPOCH).unwrap_err(),
            EngineError::InvalidInput(_)
        ));
        let short_nid = new_voter("a@example.org", "123");
        assert!(matches!(
            reg.register_voter(short_nid, TimestampMs::EPOCH).unwrap_err(),
            EngineError::InvalidInput(_)
        ));
        let alpha_nid = new_voter("a@example.org", "11112222333344AB");
        assert!(matches!(
            reg.register_voter(alpha_nid, TimestampMs::EPOCH).unwrap_err(),
            EngineError::InvalidInput(_)
        ));
    }

    #[test]
    fn registration_rejects_duplicates() {
        let reg = registry();
        reg.register_voter(
            new_voter("a@example.org", "1111222233334444"),
            TimestampMs::EPOCH,
        )
        .unwrap();
        assert!(matches!(
            reg.register_voter(
                new_voter("a@example.org", "1111222233334445"),
                TimestampMs::EPOCH,
            )
            .unwrap_err(),
            EngineError::Conflict(_)
        ));
        assert!(matches!(
            reg.register_voter(
                new_voter("b@example.org", "1111222233334444"),
                TimestampMs::EPOCH,
            )
            .unwrap_err(),
            EngineError::Conflict(_)
        ));
    }

    #[test]
    fn verify_flips_the_flag() {
        let reg = registry();
        let voter = reg
            .register_voter(
                new_voter("a@example.org", "1111222233334444"),
                TimestampMs::EPOCH,
            )
            .unwrap();
        let verified = reg.verify_voter(voter.id).unwrap();
        assert!(verified.is_verified);
    }

    #[test]
    fn election_requires_forward_window() {
        let reg = registry();
        assert!(matches!(
            reg.create_election(new_election(2_000, 2_000), TimestampMs::EPOCH)
                .unwrap_err(),
            EngineError::InvalidInput(_)
        ));
        let election = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        assert_eq!(election.status, ElectionStatus::Upcoming);
        assert_eq!(election.max_votes_per_user, 1);
    }

    #[test]
    fn status_transition_is_explicit() {
        let reg = registry();
        let election = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        let updated = reg
            .set_election_status(election.id, ElectionStatus::Active)
            .unwrap();
        assert_eq!(updated.status, ElectionStatus::Active);
    }

    #[test]
    fn candidate_number_conflict_spans_inactive() {
        let reg = registry();
        let election = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        let c1 = reg.add_candidate(new_candidate(election.id, 1)).unwrap();
        reg.deactivate_candidate(c1.id).unwrap();
        // The number stays reserved even after deactivation.
        assert!(matches!(
            reg.add_candidate(new_candidate(election.id, 1)).unwrap_err(),
            EngineError::Conflict(_)
        ));
        reg.add_candidate(new_candidate(election.id, 2)).unwrap();
    }

    #[test]
    fn update_own_number_is_not_a_conflict() {
        let reg = registry();
        let election = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        let c1 = reg.add_candidate(new_candidate(election.id, 1)).unwrap();
        let updated = reg
            .update_candidate(
                c1.id,
                CandidateUpdate {
                    name: Some("Renamed".to_string()),
                    candidate_number: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[test]
    fn candidate_for_missing_election_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.add_candidate(new_candidate(ElectionId::new(99), 1))
                .unwrap_err(),
            EngineError::NotFound(_)
        ));
    }

    #[test]
    fn active_elections_require_status_and_window() {
        let reg = registry();
        let in_window = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        let labelled_only = reg
            .create_election(new_election(5_000, 6_000), TimestampMs::EPOCH)
            .unwrap();
        reg.set_election_status(in_window.id, ElectionStatus::Active)
            .unwrap();
        reg.set_election_status(labelled_only.id, ElectionStatus::Active)
            .unwrap();
        let active = reg.active_elections(TimestampMs::new(1_500)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, in_window.id);
    }

    #[test]
    fn detail_hides_inactive_candidates() {
        let reg = registry();
        let election = reg
            .create_election(new_election(1_000, 2_000), TimestampMs::EPOCH)
            .unwrap();
        let c1 = reg.add_candidate(new_candidate(election.id, 1)).unwrap();
        reg.add_candidate(new_candidate(election.id, 2)).unwrap();
        reg.deactivate_candidate(c1.id).unwrap();
        let detail = reg.election_detail(election.id).unwrap();
        assert_eq!(detail.candidates.len(), 1);
        assert_eq!(detail.candidates[0].candidate_number, 2);
    }
}
