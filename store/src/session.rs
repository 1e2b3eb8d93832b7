//! Session storage trait.
//!
//! Sessions are written by the external authentication collaborator when
//! it issues a bearer token; the identity gate only reads them. Token
//! issuance itself (login, signing) is outside this system.

use crate::StoreError;
use ballot_types::{TimestampMs, VoterId};
use serde::{Deserialize, Serialize};

/// A bearer token resolved to a voter identity, with an expiry instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub voter_id: VoterId,
    pub expires_at: TimestampMs,
}

impl SessionRecord {
    pub fn is_expired(&self, now: TimestampMs) -> bool {
        now > self.expires_at
    }
}

/// Trait for session storage operations.
pub trait SessionStore {
    fn put_session(&self, session: &SessionRecord) -> Result<(), StoreError>;

    fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}
