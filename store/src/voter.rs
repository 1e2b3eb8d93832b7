//! Voter storage trait.

use crate::StoreError;
use ballot_types::{TimestampMs, VoterId, VoterRole};
use serde::{Deserialize, Serialize};

/// A registered voter identity.
///
/// Created at registration, never deleted. The verification flag is
/// mutated only by an admin action. `has_voted` is a denormalized
/// convenience flag; the authoritative per-election record is the votes
/// table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: VoterId,
    /// Unique login/contact address.
    pub email: String,
    pub full_name: String,
    /// Unique natural-person identifier (16-digit national id).
    pub national_id: String,
    /// Date of birth as an ISO-8601 calendar date string.
    pub date_of_birth: String,
    pub address: String,
    pub phone: String,
    pub role: VoterRole,
    /// Set by an administrator after identity review.
    pub is_verified: bool,
    /// Denormalized: whether this voter has cast a vote in any election.
    pub has_voted: bool,
    pub registered_at: TimestampMs,
    pub last_login: Option<TimestampMs>,
}

/// Explicit filter object for the admin voter listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VoterQuery {
    /// Substring match against full name, email, or national id.
    pub search: Option<String>,
    /// When set, only voters whose verification flag equals this value.
    pub verified: Option<bool>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

impl VoterQuery {
    /// 1-based page, defaulting to the first.
    pub fn effective_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Whether a voter row matches the search and verified filters.
    pub fn matches(&self, voter: &VoterRecord) -> bool {
        if !voter.role.is_admin() {
            if let Some(verified) = self.verified {
                if voter.is_verified != verified {
                    return false;
                }
            }
            if let Some(ref needle) = self.search {
                let needle = needle.to_lowercase();
                if !needle.is_empty()
                    && !voter.full_name.to_lowercase().contains(&needle)
                    && !voter.email.to_lowercase().contains(&needle)
                    && !voter.national_id.contains(&needle)
                {
                    return false;
                }
            }
            true
        } else {
            // Admin accounts never appear in the voter listing.
            false
        }
    }
}

/// One page of the voter listing plus the total match count.
#[derive(Clone, Debug, Serialize)]
pub struct VoterPage {
    pub voters: Vec<VoterRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl VoterPage {
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((self.total - 1) / self.page_size as u64 + 1) as u32
        }
    }
}

/// Trait for voter storage operations.
pub trait VoterStore {
    /// Reserve the next voter id from the backend's sequence.
    fn allocate_voter_id(&self) -> Result<VoterId, StoreError>;

    /// Insert or update a voter.
    ///
    /// Fails with [`StoreError::Duplicate`] when the email or national id
    /// is already held by a different voter.
    fn put_voter(&self, voter: &VoterRecord) -> Result<(), StoreError>;

    fn get_voter(&self, id: VoterId) -> Result<VoterRecord, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<VoterRecord>, StoreError>;

    fn find_by_national_id(&self, national_id: &str) -> Result<Option<VoterRecord>, StoreError>;

    /// Count registered identities with the voter role.
    fn voter_count(&self) -> Result<u64, StoreError>;

    /// Count verified identities with the voter role. This is a live count:
    /// turnout computed from it can change as more voters get verified.
    fn verified_voter_count(&self) -> Result<u64, StoreError>;

    /// List voters matching the query, newest registrations first.
    fn list_voters(&self, query: &VoterQuery) -> Result<VoterPage, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(name: &str, email: &str, nid: &str, verified: bool) -> VoterRecord {
        VoterRecord {
            id: VoterId::new(1),
            email: email.to_string(),
            full_name: name.to_string(),
            national_id: nid.to_string(),
            date_of_birth: "1990-01-01".to_string(),
            address: "somewhere".to_string(),
            phone: "0800000000".to_string(),
            role: VoterRole::Voter,
            is_verified: verified,
            has_voted: false,
            registered_at: TimestampMs::EPOCH,
            last_login: None,
        }
    }

    #[test]
    fn query_matches_name_case_insensitive() {
        let q = VoterQuery {
            search: Some("ALICE".to_string()),
            ..Default::default()
        };
        assert!(q.matches(&voter("Alice Smith", "a@x.org", "1111222233334444", false)));
        assert!(!q.matches(&voter("Bob Jones", "b@x.org", "1111222233334445", false)));
    }

    #[test]
    fn query_filters_verified() {
        let q = VoterQuery {
            verified: Some(true),
            ..Default::default()
        };
        assert!(q.matches(&voter("Alice", "a@x.org", "1", true)));
        assert!(!q.matches(&voter("Bob", "b@x.org", "2", false)));
    }

    #[test]
    fn query_excludes_admins() {
        let mut v = voter("Root", "root@x.org", "0", true);
        v.role = VoterRole::Admin;
        assert!(!VoterQuery::default().matches(&v));
    }

    #[test]
    fn page_size_clamped() {
        let q = VoterQuery {
            page_size: Some(5000),
            ..Default::default()
        };
        assert_eq!(q.effective_page_size(), MAX_PAGE_SIZE);
        let q = VoterQuery {
            page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(q.effective_page_size(), 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = VoterPage {
            voters: vec![],
            total: 21,
            page: 1,
            page_size: 10,
        };
        assert_eq!(page.total_pages(), 3);
        let empty = VoterPage {
            voters: vec![],
            total: 0,
            page: 1,
            page_size: 10,
        };
        assert_eq!(empty.total_pages(), 0);
    }
}
