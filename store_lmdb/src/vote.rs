//! LMDB implementation of VoteStore.
//!
//! `cast` is the critical section of the whole platform: one LMDB write
//! transaction covers the duplicate check, the vote insert, both index
//! inserts, the candidate counter increment, and the voter flag update.
//! LMDB serializes write transactions, so the loser of a concurrent
//! double-cast race observes the winner's row and fails with
//! `StoreError::Duplicate` — partial effects cannot occur because an
//! uncommitted transaction aborts as a whole.

use std::ops::Bound;

use ballot_store::candidate::CandidateRecord;
use ballot_store::vote::{VoteRecord, VoteStore};
use ballot_store::voter::VoterRecord;
use ballot_store::StoreError;
use ballot_types::{ElectionId, ReceiptHash, VoterId};

use crate::environment::LmdbEnvironment;
use crate::keys::{election_vote_key, increment_prefix, vote_key};
use crate::LmdbError;

impl VoteStore for LmdbEnvironment {
    fn cast(&self, vote: &VoteRecord) -> Result<(), StoreError> {
        let primary = vote_key(vote.voter_id, vote.election_id);
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;

        if self
            .votes_db
            .get(&wtxn, &primary)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "vote by voter {} in election {}",
                vote.voter_id, vote.election_id
            )));
        }
        if self
            .vote_hash_db
            .get(&wtxn, vote.hash.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("vote hash {}", vote.hash)));
        }

        // Re-read the referenced rows inside the transaction so the
        // counter and flag updates apply to current state.
        let candidate_key = vote.candidate_id.to_be_bytes();
        let mut candidate: CandidateRecord = match self
            .candidates_db
            .get(&wtxn, &candidate_key)
            .map_err(LmdbError::from)?
        {
            Some(val) => bincode::deserialize(val).map_err(LmdbError::from)?,
            None => {
                return Err(StoreError::NotFound(format!(
                    "candidate {}",
                    vote.candidate_id
                )))
            }
        };
        let voter_key = vote.voter_id.to_be_bytes();
        let mut voter: VoterRecord = match self
            .voters_db
            .get(&wtxn, &voter_key)
            .map_err(LmdbError::from)?
        {
            Some(val) => bincode::deserialize(val).map_err(LmdbError::from)?,
            None => return Err(StoreError::NotFound(format!("voter {}", vote.voter_id))),
        };

        self.votes_db
            .put(&mut wtxn, &primary, &bytes)
            .map_err(LmdbError::from)?;
        self.vote_election_db
            .put(
                &mut wtxn,
                &election_vote_key(vote.election_id, vote.voter_id),
                &primary,
            )
            .map_err(LmdbError::from)?;
        self.vote_hash_db
            .put(&mut wtxn, vote.hash.as_bytes(), &primary)
            .map_err(LmdbError::from)?;

        candidate.vote_count += 1;
        let candidate_bytes = bincode::serialize(&candidate).map_err(LmdbError::from)?;
        self.candidates_db
            .put(&mut wtxn, &candidate_key, &candidate_bytes)
            .map_err(LmdbError::from)?;

        voter.has_voted = true;
        let voter_bytes = bincode::serialize(&voter).map_err(LmdbError::from)?;
        self.voters_db
            .put(&mut wtxn, &voter_key, &voter_bytes)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(
            election = %vote.election_id,
            candidate = %vote.candidate_id,
            hash = ?vote.hash,
            "vote recorded"
        );
        Ok(())
    }

    fn get_vote(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .votes_db
            .get(&rtxn, &vote_key(voter_id, election_id))
            .map_err(LmdbError::from)?
        {
            Some(val) => Ok(Some(bincode::deserialize(val).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn get_vote_by_hash(&self, hash: &ReceiptHash) -> Result<Option<VoteRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let primary = match self
            .vote_hash_db
            .get(&rtxn, hash.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(key) => key,
            None => return Ok(None),
        };
        let val = self
            .votes_db
            .get(&rtxn, primary)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                StoreError::Corruption("vote hash index points at missing row".to_string())
            })?;
        Ok(Some(bincode::deserialize(val).map_err(LmdbError::from)?))
    }

    fn votes_for_election(&self, election_id: ElectionId) -> Result<Vec<VoteRecord>, StoreError> {
        let prefix = election_id.to_be_bytes();
        let mut upper = prefix;
        let bounded = increment_prefix(&mut upper);

        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let bounds = if bounded {
            (Bound::Included(prefix.as_slice()), Bound::Excluded(upper.as_slice()))
        } else {
            (Bound::Included(prefix.as_slice()), Bound::Unbounded)
        };
        let mut found = Vec::new();
        for result in self
            .vote_election_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            let (_key, primary) = result.map_err(LmdbError::from)?;
            let val = self
                .votes_db
                .get(&rtxn, primary)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption("vote election index points at missing row".to_string())
                })?;
            found.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(found)
    }

    fn votes_by_voter(&self, voter_id: VoterId) -> Result<Vec<VoteRecord>, StoreError> {
        let prefix = voter_id.to_be_bytes();
        let mut upper = prefix;
        let bounded = increment_prefix(&mut upper);

        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let bounds = if bounded {
            (Bound::Included(prefix.as_slice()), Bound::Excluded(upper.as_slice()))
        } else {
            (Bound::Included(prefix.as_slice()), Bound::Unbounded)
        };
        let mut found: Vec<VoteRecord> = Vec::new();
        for result in self.votes_db.range(&rtxn, &bounds).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            found.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        found.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));
        Ok(found)
    }

    fn count_for_election(&self, election_id: ElectionId) -> Result<u64, StoreError> {
        let prefix = election_id.to_be_bytes();
        let mut upper = prefix;
        let bounded = increment_prefix(&mut upper);

        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let bounds = if bounded {
            (Bound::Included(prefix.as_slice()), Bound::Excluded(upper.as_slice()))
        } else {
            (Bound::Included(prefix.as_slice()), Bound::Unbounded)
        };
        let mut count = 0u64;
        for result in self
            .vote_election_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            result.map_err(LmdbError::from)?;
            count += 1;
        }
        Ok(count)
    }

    fn total_vote_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.votes_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn recent_votes(&self, limit: usize) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut all: Vec<VoteRecord> = Vec::new();
        for result in self.votes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            all.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        all.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));
        all.truncate(limit);
        Ok(all)
    }
}
