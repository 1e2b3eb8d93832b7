//! In-memory storage backend.
//!
//! Implements every storage trait with the same constraint semantics as
//! the LMDB backend, guarded by a single mutex so multi-step operations
//! (notably [`VoteStore::cast`]) are atomic. Intended for tests and local
//! experimentation, not production use.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use ballot_types::{CandidateId, ElectionId, ReceiptHash, VoterId};

use crate::candidate::{CandidateRecord, CandidateStore};
use crate::election::{ElectionRecord, ElectionStore};
use crate::session::{SessionRecord, SessionStore};
use crate::vote::{VoteRecord, VoteStore};
use crate::voter::{VoterPage, VoterQuery, VoterRecord, VoterStore};
use crate::StoreError;

#[derive(Default)]
struct Inner {
    voters: BTreeMap<u64, VoterRecord>,
    elections: BTreeMap<u64, ElectionRecord>,
    candidates: BTreeMap<u64, CandidateRecord>,
    /// Primary vote table keyed by `(voter_id, election_id)` — this map
    /// key is the one-vote-per-election constraint.
    votes: BTreeMap<(u64, u64), VoteRecord>,
    /// Receipt hash uniqueness index.
    vote_hashes: HashMap<[u8; 32], (u64, u64)>,
    sessions: HashMap<String, SessionRecord>,
    next_voter_id: u64,
    next_election_id: u64,
    next_candidate_id: u64,
}

/// Mutex-guarded in-memory implementation of all storage traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store mutex poisoned".to_string()))
    }
}

impl VoterStore for MemoryStore {
    fn allocate_voter_id(&self) -> Result<VoterId, StoreError> {
        let mut inner = self.lock()?;
        inner.next_voter_id += 1;
        Ok(VoterId::new(inner.next_voter_id))
    }

    fn put_voter(&self, voter: &VoterRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for other in inner.voters.values() {
            if other.id == voter.id {
                continue;
            }
            if other.email == voter.email {
                return Err(StoreError::Duplicate(format!("email '{}'", voter.email)));
            }
            if other.national_id == voter.national_id {
                return Err(StoreError::Duplicate(format!(
                    "national id '{}'",
                    voter.national_id
                )));
            }
        }
        inner.voters.insert(voter.id.as_u64(), voter.clone());
        Ok(())
    }

    fn get_voter(&self, id: VoterId) -> Result<VoterRecord, StoreError> {
        self.lock()?
            .voters
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("voter {id}")))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<VoterRecord>, StoreError> {
        Ok(self
            .lock()?
            .voters
            .values()
            .find(|v| v.email == email)
            .cloned())
    }

    fn find_by_national_id(&self, national_id: &str) -> Result<Option<VoterRecord>, StoreError> {
        Ok(self
            .lock()?
            .voters
            .values()
            .find(|v| v.national_id == national_id)
            .cloned())
    }

    fn voter_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .voters
            .values()
            .filter(|v| !v.role.is_admin())
            .count() as u64)
    }

    fn verified_voter_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .voters
            .values()
            .filter(|v| !v.role.is_admin() && v.is_verified)
            .count() as u64)
    }

    fn list_voters(&self, query: &VoterQuery) -> Result<VoterPage, StoreError> {
        let inner = self.lock()?;
        let mut matched: Vec<VoterRecord> = inner
            .voters
            .values()
            .filter(|v| query.matches(v))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.registered_at
                .cmp(&a.registered_at)
                .then(b.id.as_u64().cmp(&a.id.as_u64()))
        });
        let total = matched.len() as u64;
        let page = query.effective_page();
        let page_size = query.effective_page_size();
        let offset = (page as usize - 1) * page_size as usize;
        let voters = matched
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        Ok(VoterPage {
            voters,
            total,
            page,
            page_size,
        })
    }
}

impl ElectionStore for MemoryStore {
    fn allocate_election_id(&self) -> Result<ElectionId, StoreError> {
        let mut inner = self.lock()?;
        inner.next_election_id += 1;
        Ok(ElectionId::new(inner.next_election_id))
    }

    fn put_election(&self, election: &ElectionRecord) -> Result<(), StoreError> {
        self.lock()?
            .elections
            .insert(election.id.as_u64(), election.clone());
        Ok(())
    }

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError> {
        self.lock()?
            .elections
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("election {id}")))
    }

    fn list_elections(&self) -> Result<Vec<ElectionRecord>, StoreError> {
        let inner = self.lock()?;
        let mut all: Vec<ElectionRecord> = inner.elections.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_u64().cmp(&a.id.as_u64()))
        });
        Ok(all)
    }

    fn election_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.elections.len() as u64)
    }

    fn active_election_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .elections
            .values()
            .filter(|e| e.status == ballot_types::ElectionStatus::Active)
            .count() as u64)
    }
}

impl CandidateStore for MemoryStore {
    fn allocate_candidate_id(&self) -> Result<CandidateId, StoreError> {
        let mut inner = self.lock()?;
        inner.next_candidate_id += 1;
        Ok(CandidateId::new(inner.next_candidate_id))
    }

    fn put_candidate(&self, candidate: &CandidateRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let taken = inner.candidates.values().any(|other| {
            other.id != candidate.id
                && other.election_id == candidate.election_id
                && other.candidate_number == candidate.candidate_number
        });
        if taken {
            return Err(StoreError::Duplicate(format!(
                "candidate number {} in election {}",
                candidate.candidate_number, candidate.election_id
            )));
        }
        inner
            .candidates
            .insert(candidate.id.as_u64(), candidate.clone());
        Ok(())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError> {
        self.lock()?
            .candidates
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))
    }

    fn candidates_for_election(
        &self,
        election_id: ElectionId,
    ) -> Result<Vec<CandidateRecord>, StoreError> {
        let inner = self.lock()?;
        let mut found: Vec<CandidateRecord> = inner
            .candidates
            .values()
            .filter(|c| c.election_id == election_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.candidate_number);
        Ok(found)
    }
}

impl VoteStore for MemoryStore {
    fn cast(&self, vote: &VoteRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let key = (vote.voter_id.as_u64(), vote.election_id.as_u64());
        if inner.votes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "vote by voter {} in election {}",
                vote.voter_id, vote.election_id
            )));
        }
        if inner.vote_hashes.contains_key(vote.hash.as_bytes()) {
            return Err(StoreError::Duplicate(format!("vote hash {}", vote.hash)));
        }
        // Re-read the referenced rows inside the critical section so the
        // counter and flag updates cannot be applied against missing rows.
        if !inner.voters.contains_key(&vote.voter_id.as_u64()) {
            return Err(StoreError::NotFound(format!("voter {}", vote.voter_id)));
        }
        let candidate_key = vote.candidate_id.as_u64();
        if !inner.candidates.contains_key(&candidate_key) {
            return Err(StoreError::NotFound(format!(
                "candidate {}",
                vote.candidate_id
            )));
        }

        inner.votes.insert(key, vote.clone());
        inner.vote_hashes.insert(*vote.hash.as_bytes(), key);
        if let Some(candidate) = inner.candidates.get_mut(&candidate_key) {
            candidate.vote_count += 1;
        }
        if let Some(voter) = inner.voters.get_mut(&vote.voter_id.as_u64()) {
            voter.has_voted = true;
        }
        Ok(())
    }

    fn get_vote(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self
            .lock()?
            .votes
            .get(&(voter_id.as_u64(), election_id.as_u64()))
            .cloned())
    }

    fn get_vote_by_hash(&self, hash: &ReceiptHash) -> Result<Option<VoteRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .vote_hashes
            .get(hash.as_bytes())
            .and_then(|key| inner.votes.get(key))
            .cloned())
    }

    fn votes_for_election(&self, election_id: ElectionId) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .lock()?
            .votes
            .values()
            .filter(|v| v.election_id == election_id)
            .cloned()
            .collect())
    }

    fn votes_by_voter(&self, voter_id: VoterId) -> Result<Vec<VoteRecord>, StoreError> {
        let inner = self.lock()?;
        let mut found: Vec<VoteRecord> = inner
            .votes
            .values()
            .filter(|v| v.voter_id == voter_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));
        Ok(found)
    }

    fn count_for_election(&self, election_id: ElectionId) -> Result<u64, StoreError> {
        Ok(self
            .lock()?
            .votes
            .values()
            .filter(|v| v.election_id == election_id)
            .count() as u64)
    }

    fn total_vote_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.votes.len() as u64)
    }

    fn recent_votes(&self, limit: usize) -> Result<Vec<VoteRecord>, StoreError> {
        let inner = self.lock()?;
        let mut all: Vec<VoteRecord> = inner.votes.values().cloned().collect();
        all.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));
        all.truncate(limit);
        Ok(all)
    }
}

impl SessionStore for MemoryStore {
    fn put_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        self.lock()?
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.sessions.get(token).cloned())
    }

    fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.lock()?.sessions.remove(token);
        Ok(())
    }
}
