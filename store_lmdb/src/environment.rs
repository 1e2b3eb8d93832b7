//! LMDB environment setup.
//!
//! One heed `Env` holds every table and uniqueness index as a named
//! database. The environment itself implements all the `ballot-store`
//! traits; handlers share it behind an `Arc`.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use ballot_store::StoreError;

use crate::LmdbError;

const SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// voter_id → `VoterRecord`
    pub(crate) voters_db: Database<Bytes, Bytes>,
    /// email → voter_id (uniqueness index)
    pub(crate) voter_email_db: Database<Bytes, Bytes>,
    /// national_id → voter_id (uniqueness index)
    pub(crate) voter_national_id_db: Database<Bytes, Bytes>,
    /// election_id → `ElectionRecord`
    pub(crate) elections_db: Database<Bytes, Bytes>,
    /// candidate_id → `CandidateRecord`
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    /// election_id ++ candidate_number → candidate_id (uniqueness index)
    pub(crate) candidate_number_db: Database<Bytes, Bytes>,
    /// voter_id ++ election_id → `VoteRecord` (primary vote table; the
    /// key is the one-vote-per-election constraint)
    pub(crate) votes_db: Database<Bytes, Bytes>,
    /// election_id ++ voter_id → primary vote key (election-scoped index)
    pub(crate) vote_election_db: Database<Bytes, Bytes>,
    /// receipt hash → primary vote key (uniqueness index)
    pub(crate) vote_hash_db: Database<Bytes, Bytes>,
    /// token → `SessionRecord`
    pub(crate) sessions_db: Database<Bytes, Bytes>,
    /// schema version and id sequences
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create data dir: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(16)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let voters_db = env.create_database(&mut wtxn, Some("voters"))?;
        let voter_email_db = env.create_database(&mut wtxn, Some("voter_email"))?;
        let voter_national_id_db = env.create_database(&mut wtxn, Some("voter_national_id"))?;
        let elections_db = env.create_database(&mut wtxn, Some("elections"))?;
        let candidates_db = env.create_database(&mut wtxn, Some("candidates"))?;
        let candidate_number_db = env.create_database(&mut wtxn, Some("candidate_number"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let vote_election_db = env.create_database(&mut wtxn, Some("vote_election"))?;
        let vote_hash_db = env.create_database(&mut wtxn, Some("vote_hash"))?;
        let sessions_db = env.create_database(&mut wtxn, Some("sessions"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        if meta_db.get(&wtxn, SCHEMA_VERSION_KEY)?.is_none() {
            meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())?;
        }
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            voters_db,
            voter_email_db,
            voter_national_id_db,
            elections_db,
            candidates_db,
            candidate_number_db,
            votes_db,
            vote_election_db,
            vote_hash_db,
            sessions_db,
            meta_db,
        })
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    /// Stored schema version, for future migrations.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) if bytes.len() == 4 => {
                let arr: [u8; 4] = bytes.try_into().expect("checked length");
                Ok(u32::from_le_bytes(arr))
            }
            Some(_) => Err(StoreError::Corruption(
                "schema_version has unexpected byte length".to_string(),
            )),
            None => Ok(0),
        }
    }

    /// Bump and return the next value of a named id sequence.
    pub(crate) fn next_seq(&self, name: &str) -> Result<u64, StoreError> {
        let key = format!("seq:{name}");
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let current = match self
            .meta_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) if bytes.len() == 8 => {
                let arr: [u8; 8] = bytes.try_into().expect("checked length");
                u64::from_le_bytes(arr)
            }
            Some(_) => {
                return Err(StoreError::Corruption(format!(
                    "sequence '{name}' has unexpected byte length"
                )))
            }
            None => 0,
        };
        let next = current + 1;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), &next.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(next)
    }
}
