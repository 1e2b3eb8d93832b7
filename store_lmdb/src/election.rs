//! LMDB implementation of ElectionStore.

use ballot_store::election::{ElectionRecord, ElectionStore};
use ballot_store::StoreError;
use ballot_types::{ElectionId, ElectionStatus};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl ElectionStore for LmdbEnvironment {
    fn allocate_election_id(&self) -> Result<ElectionId, StoreError> {
        self.next_seq("election").map(ElectionId::new)
    }

    fn put_election(&self, election: &ElectionRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(election).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.elections_db
            .put(&mut wtxn, &election.id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .elections_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("election {id}")))?;
        let election: ElectionRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(election)
    }

    fn list_elections(&self) -> Result<Vec<ElectionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut all = Vec::new();
        for result in self.elections_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let election: ElectionRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            all.push(election);
        }
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_u64().cmp(&a.id.as_u64()))
        });
        Ok(all)
    }

    fn election_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.elections_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn active_election_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in self.elections_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let election: ElectionRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if election.status == ElectionStatus::Active {
                count += 1;
            }
        }
        Ok(count)
    }
}
