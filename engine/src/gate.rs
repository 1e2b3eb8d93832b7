//! Identity & eligibility gate.
//!
//! Resolves a bearer token to a voter record and enforces the two
//! capability checks that precede every mutating operation: the
//! verification flag for casting, and the admin role for management
//! operations. The gate holds no state beyond the store handle.

use std::sync::Arc;

use ballot_store::voter::VoterRecord;
use ballot_store::{BallotStore, StoreError};
use ballot_types::TimestampMs;

use crate::error::EngineError;

pub struct IdentityGate<S> {
    store: Arc<S>,
}

impl<S> Clone for IdentityGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BallotStore> IdentityGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve a bearer token to the voter it references.
    ///
    /// Fails with `Unauthenticated` when the token is unknown or expired,
    /// and `NotFound` when the session is valid but the referenced
    /// identity no longer exists.
    pub fn authenticate(&self, token: &str, now: TimestampMs) -> Result<VoterRecord, EngineError> {
        let session = self
            .store
            .get_session(token)?
            .ok_or_else(|| EngineError::Unauthenticated("invalid token".to_string()))?;
        if session.is_expired(now) {
            return Err(EngineError::Unauthenticated("token expired".to_string()));
        }
        match self.store.get_voter(session.voter_id) {
            Ok(voter) => Ok(voter),
            Err(StoreError::NotFound(_)) => {
                Err(EngineError::NotFound(format!("voter {}", session.voter_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Required before any vote-casting operation.
    pub fn require_verified(&self, voter: &VoterRecord) -> Result<(), EngineError> {
        if voter.is_verified {
            Ok(())
        } else {
            Err(EngineError::Forbidden(
                "account verification required".to_string(),
            ))
        }
    }

    /// Required before any admin-only operation.
    pub fn require_admin(&self, voter: &VoterRecord) -> Result<(), EngineError> {
        if voter.role.is_admin() {
            Ok(())
        } else {
            Err(EngineError::Forbidden("admin access required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_store::session::{SessionRecord, SessionStore};
    use ballot_store::voter::VoterStore;
    use ballot_store::MemoryStore;
    use ballot_types::{VoterId, VoterRole};

    fn store_with_voter(verified: bool, role: VoterRole) -> Arc<MemoryStore> {
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
                role,
                is_verified: verified,
                has_voted: false,
                registered_at: TimestampMs::EPOCH,
                last_login: None,
            })
            .unwrap();
        store
            .put_session(&SessionRecord {
                token: "good".to_string(),
                voter_id: VoterId::new(1),
                expires_at: TimestampMs::new(10_000),
            })
            .unwrap();
        store
    }

    #[test]
    fn unknown_token_is_unauthenticated() {
        let gate = IdentityGate::new(store_with_voter(true, VoterRole::Voter));
        let err = gate.authenticate("bad", TimestampMs::new(1)).unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let gate = IdentityGate::new(store_with_voter(true, VoterRole::Voter));
        let err = gate
            .authenticate("good", TimestampMs::new(10_001))
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[test]
    fn valid_token_resolves_voter() {
        let gate = IdentityGate::new(store_with_voter(true, VoterRole::Voter));
        let voter = gate.authenticate("good", TimestampMs::new(1)).unwrap();
        assert_eq!(voter.id, VoterId::new(1));
    }

    #[test]
    fn dangling_session_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_session(&SessionRecord {
                token: "orphan".to_string(),
                voter_id: VoterId::new(99),
                expires_at: TimestampMs::new(10_000),
            })
            .unwrap();
        let gate = IdentityGate::new(store);
        let err = gate.authenticate("orphan", TimestampMs::new(1)).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn unverified_voter_forbidden() {
        let gate = IdentityGate::new(store_with_voter(false, VoterRole::Voter));
        let voter = gate.authenticate("good", TimestampMs::new(1)).unwrap();
        assert!(matches!(
            gate.require_verified(&voter).unwrap_err(),
            EngineError::Forbidden(_)
        ));
    }

    #[test]
    fn non_admin_forbidden_for_admin_ops() {
        let gate = IdentityGate::new(store_with_voter(true, VoterRole::Voter));
        let voter = gate.authenticate("good", TimestampMs::new(1)).unwrap();
        assert!(matches!(
            gate.require_admin(&voter).unwrap_err(),
            EngineError::Forbidden(_)
        ));
        assert!(gate.require_verified(&voter).is_ok());
    }
}
