//! LMDB implementation of VoterStore.

use ballot_store::voter::{VoterPage, VoterQuery, VoterRecord, VoterStore};
use ballot_store::StoreError;
use ballot_types::VoterId;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl LmdbEnvironment {
    fn read_voter_by_index(
        &self,
        rtxn: &heed::RoTxn<'_>,
        id_bytes: &[u8],
    ) -> Result<Option<VoterRecord>, StoreError> {
        let val = self
            .voters_db
            .get(rtxn, id_bytes)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let voter: VoterRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(voter))
            }
            None => Ok(None),
        }
    }
}

impl VoterStore for LmdbEnvironment {
    fn allocate_voter_id(&self) -> Result<VoterId, StoreError> {
        self.next_seq("voter").map(VoterId::new)
    }

    fn put_voter(&self, voter: &VoterRecord) -> Result<(), StoreError> {
        let id_bytes = voter.id.to_be_bytes();
        let bytes = bincode::serialize(voter).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;

        // Uniqueness of email and national id across other voters.
        if let Some(owner) = self
            .voter_email_db
            .get(&wtxn, voter.email.as_bytes())
            .map_err(LmdbError::from)?
        {
            if owner != id_bytes {
                return Err(StoreError::Duplicate(format!("email '{}'", voter.email)));
            }
        }
        if let Some(owner) = self
            .voter_national_id_db
            .get(&wtxn, voter.national_id.as_bytes())
            .map_err(LmdbError::from)?
        {
            if owner != id_bytes {
                return Err(StoreError::Duplicate(format!(
                    "national id '{}'",
                    voter.national_id
                )));
            }
        }

        // Drop stale index entries when an update changes email or
        // national id.
        if let Some(previous) = self
            .voters_db
            .get(&wtxn, &id_bytes)
            .map_err(LmdbError::from)?
        {
            let previous: VoterRecord = bincode::deserialize(previous).map_err(LmdbError::from)?;
            if previous.email != voter.email {
                self.voter_email_db
                    .delete(&mut wtxn, previous.email.as_bytes())
                    .map_err(LmdbError::from)?;
            }
            if previous.national_id != voter.national_id {
                self.voter_national_id_db
                    .delete(&mut wtxn, previous.national_id.as_bytes())
                    .map_err(LmdbError::from)?;
            }
        }

        self.voters_db
            .put(&mut wtxn, &id_bytes, &bytes)
            .map_err(LmdbError::from)?;
        self.voter_email_db
            .put(&mut wtxn, voter.email.as_bytes(), &id_bytes)
            .map_err(LmdbError::from)?;
        self.voter_national_id_db
            .put(&mut wtxn, voter.national_id.as_bytes(), &id_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_voter(&self, id: VoterId) -> Result<VoterRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        self.read_voter_by_index(&rtxn, &id.to_be_bytes())?
            .ok_or_else(|| StoreError::NotFound(format!("voter {id}")))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<VoterRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .voter_email_db
            .get(&rtxn, email.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(id_bytes) => {
                let id_bytes = id_bytes.to_vec();
                self.read_voter_by_index(&rtxn, &id_bytes)
            }
            None => Ok(None),
        }
    }

    fn find_by_national_id(&self, national_id: &str) -> Result<Option<VoterRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .voter_national_id_db
            .get(&rtxn, national_id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(id_bytes) => {
                let id_bytes = id_bytes.to_vec();
                self.read_voter_by_index(&rtxn, &id_bytes)
            }
            None => Ok(None),
        }
    }

    fn voter_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in self.voters_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let voter: VoterRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if !voter.role.is_admin() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn verified_voter_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in self.voters_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let voter: VoterRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if !voter.role.is_admin() && voter.is_verified {
                count += 1;
            }
        }
        Ok(count)
    }

    fn list_voters(&self, query: &VoterQuery) -> Result<VoterPage, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut matched = Vec::new();
        for result in self.voters_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let voter: VoterRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if query.matches(&voter) {
                matched.push(voter);
            }
        }
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
