//! Receipt hashing and anonymous verification.
//!
//! The receipt digest binds voter, candidate, election, and the cast
//! instant. Because the cast timestamp is part of the preimage, two
//! votes never share a hash in practice, and the 32-byte output reveals
//! none of its inputs. Verification by hash returns only vote and
//! candidate facts, never the voter.

use std::sync::Arc;

use ballot_store::BallotStore;
use ballot_types::{CandidateId, ElectionId, ElectionStatus, ReceiptHash, TimestampMs, VoterId};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::EngineError;

/// Digest the identifying inputs of a cast vote into its receipt hash.
///
/// The preimage is the dash-joined decimal rendering of the ids and the
/// cast timestamp in milliseconds.
pub fn compute_receipt_hash(
    voter_id: VoterId,
    candidate_id: CandidateId,
    election_id: ElectionId,
    cast_at: TimestampMs,
) -> ReceiptHash {
    let preimage = format!(
        "{}-{}-{}-{}",
        voter_id,
        candidate_id,
        election_id,
        cast_at.as_millis()
    );
    let digest = Sha256::digest(preimage.as_bytes());
    ReceiptHash::new(digest.into())
}

/// What a receipt hash resolves to. Carries no voter-identifying fields.
#[derive(Clone, Debug, Serialize)]
pub struct VerifiedVote {
    pub hash: ReceiptHash,
    pub election_id: ElectionId,
    pub election_title: String,
    pub candidate_name: String,
    pub candidate_party: Option<String>,
    pub candidate_number: u32,
    pub cast_at: TimestampMs,
}

/// Per-election casting status for the asking voter.
#[derive(Clone, Debug, Serialize)]
pub struct VoteStatus {
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_hash: Option<ReceiptHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_at: Option<TimestampMs>,
}

/// One line of a voter's own casting history. Caller-scoped, so unlike
/// [`VerifiedVote`] it may name the chosen candidate.
#[derive(Clone, Debug, Serialize)]
pub struct VoteHistoryEntry {
    pub election_id: ElectionId,
    pub election_title: String,
    pub election_status: ElectionStatus,
    pub candidate_name: String,
    pub candidate_party: Option<String>,
    pub candidate_number: u32,
    pub hash: ReceiptHash,
    pub cast_at: TimestampMs,
}

pub struct ReceiptService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReceiptService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BallotStore> ReceiptService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve a receipt hash presented by anyone holding it.
    ///
    /// Open to unauthenticated callers; the response confirms the vote
    /// was recorded and names the candidate and election, nothing else.
    pub fn verify_vote(&self, hash: &ReceiptHash) -> Result<VerifiedVote, EngineError> {
        let vote = self
            .store
            .get_vote_by_hash(hash)?
            .ok_or_else(|| EngineError::NotFound("vote".to_string()))?;
        let election = self.store.get_election(vote.election_id)?;
        let candidate = self.store.get_candidate(vote.candidate_id)?;
        Ok(VerifiedVote {
            hash: vote.hash,
            election_id: election.id,
            election_title: election.title,
            candidate_name: candidate.name,
            candidate_party: candidate.party,
            candidate_number: candidate.candidate_number,
            cast_at: vote.cast_at,
        })
    }

    /// Whether the voter has already cast in the election, with their own
    /// receipt when they have.
    pub fn vote_status(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<VoteStatus, EngineError> {
        // Election existence is checked so a status probe against a
        // made-up id is a 404, not a quiet "not voted".
        self.store.get_election(election_id)?;
        match self.store.get_vote(voter_id, election_id)? {
            Some(vote) => Ok(VoteStatus {
                has_voted: true,
                vote_hash: Some(vote.hash),
                cast_at: Some(vote.cast_at),
            }),
            None => Ok(VoteStatus {
                has_voted: false,
                vote_hash: None,
                cast_at: None,
            }),
        }
    }

    /// The voter's own casting history, newest first.
    pub fn vote_history(&self, voter_id: VoterId) -> Result<Vec<VoteHistoryEntry>, EngineError> {
        let votes = self.store.votes_by_voter(voter_id)?;
        let mut entries = Vec::with_capacity(votes.len());
        for vote in votes {
            let election = self.store.get_election(vote.election_id)?;
            let candidate = self.store.get_candidate(vote.candidate_id)?;
            entries.push(VoteHistoryEntry {
                election_id: election.id,
                election_title: election.title,
                election_status: election.status,
                candidate_name: candidate.name,
                candidate_party: candidate.party,
                candidate_number: candidate.candidate_number,
                hash: vote.hash,
                cast_at: vote.cast_at,
            });
        }
        Ok(entries)
    }
}
