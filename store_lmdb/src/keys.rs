//! Composite key construction for the LMDB databases.
//!
//! All numeric key components are big-endian so that lexicographic LMDB
//! key order matches numeric order, and all composite keys are fixed
//! width, so prefix range scans never match a partial component.

use ballot_types::{CandidateId, ElectionId, VoterId};

/// Primary vote key: `voter_id ++ election_id`. The existence of this key
/// is the one-vote-per-election uniqueness constraint.
pub fn vote_key(voter_id: VoterId, election_id: ElectionId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&voter_id.to_be_bytes());
    key[8..].copy_from_slice(&election_id.to_be_bytes());
    key
}

/// Election-scoped vote index key: `election_id ++ voter_id`.
pub fn election_vote_key(election_id: ElectionId, voter_id: VoterId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&election_id.to_be_bytes());
    key[8..].copy_from_slice(&voter_id.to_be_bytes());
    key
}

/// Candidate number index key: `election_id ++ candidate_number`.
pub fn candidate_number_key(election_id: ElectionId, number: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&election_id.to_be_bytes());
    key[8..].copy_from_slice(&number.to_be_bytes());
    key
}

/// Compute the exclusive upper bound for a prefix range scan by
/// incrementing the prefix as a big-endian integer.
///
/// Returns `false` when the prefix was all `0xFF` and no finite upper
/// bound exists; callers scan unbounded-above in that case.
pub fn increment_prefix(prefix: &mut [u8]) -> bool {
    for byte in prefix.iter_mut().rev() {
        if *byte == u8::MAX {
            *byte = 0;
        } else {
            *byte += 1;
            return true;
        }
    }
    false
}
