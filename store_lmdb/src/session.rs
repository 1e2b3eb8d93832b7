//! LMDB implementation of SessionStore.

use ballot_store::session::{SessionRecord, SessionStore};
use ballot_store::StoreError;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl SessionStore for LmdbEnvironment {
    fn put_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(session).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.sessions_db
            .put(&mut wtxn, session.token.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .sessions_db
            .get(&rtxn, token.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(val) => Ok(Some(bincode::deserialize(val).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.sessions_db
            .delete(&mut wtxn, token.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
