//! LMDB implementation of CandidateStore.
//!
//! The `candidate_number` index spans active and inactive candidates
//! alike: a soft-deleted candidate keeps its number reserved.

use std::ops::Bound;

use ballot_store::candidate::{CandidateRecord, CandidateStore};
use ballot_store::StoreError;
use ballot_types::{CandidateId, ElectionId};

use crate::environment::LmdbEnvironment;
use crate::keys::{candidate_number_key, increment_prefix};
use crate::LmdbError;

impl CandidateStore for LmdbEnvironment {
    fn allocate_candidate_id(&self) -> Result<CandidateId, StoreError> {
        self.next_seq("candidate").map(CandidateId::new)
    }

    fn put_candidate(&self, candidate: &CandidateRecord) -> Result<(), StoreError> {
        let id_bytes = candidate.id.to_be_bytes();
        let number_key = candidate_number_key(candidate.election_id, candidate.candidate_number);
        let bytes = bincode::serialize(candidate).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;

        if let Some(owner) = self
            .candidate_number_db
            .get(&wtxn, &number_key)
            .map_err(LmdbError::from)?
        {
            if owner != id_bytes {
                return Err(StoreError::Duplicate(format!(
                    "candidate number {} in election {}",
                    candidate.candidate_number, candidate.election_id
                )));
            }
        }

        // Release the old number when an update moves the candidate.
        if let Some(previous) = self
            .candidates_db
            .get(&wtxn, &id_bytes)
            .map_err(LmdbError::from)?
        {
            let previous: CandidateRecord =
                bincode::deserialize(previous).map_err(LmdbError::from)?;
            if previous.election_id != candidate.election_id
                || previous.candidate_number != candidate.candidate_number
            {
                let old_key =
                    candidate_number_key(previous.election_id, previous.candidate_number);
                self.candidate_number_db
                    .delete(&mut wtxn, &old_key)
                    .map_err(LmdbError::from)?;
            }
        }

        self.candidates_db
            .put(&mut wtxn, &id_bytes, &bytes)
            .map_err(LmdbError::from)?;
        self.candidate_number_db
            .put(&mut wtxn, &number_key, &id_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .candidates_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))?;
        let candidate: CandidateRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(candidate)
    }

    fn candidates_for_election(
        &self,
        election_id: ElectionId,
    ) -> Result<Vec<CandidateRecord>, StoreError> {
        let prefix = election_id.to_be_bytes();
        let mut upper = prefix;
        let bounded = increment_prefix(&mut upper);

        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let bounds = if bounded {
            (Bound::Included(prefix.as_slice()), Bound::Excluded(upper.as_slice()))
        } else {
            (Bound::Included(prefix.as_slice()), Bound::Unbounded)
        };
        // The number index is already ordered by candidate number.
        let mut found = Vec::new();
        for result in self
            .candidate_number_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            let (_key, id_bytes) = result.map_err(LmdbError::from)?;
            let val = self
                .candidates_db
                .get(&rtxn, id_bytes)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption("candidate number index points at missing row".to_string())
                })?;
            let candidate: CandidateRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            found.push(candidate);
        }
        Ok(found)
    }
}
