//! Results, turnout, and dashboard aggregation.
//!
//! Tallies read the denormalized per-candidate counters, which the store
//! keeps welded to the vote log inside the cast transaction. Percentages
//! are rendered as fixed two-decimal strings computed with integer math
//! (half-up), so the wire value is stable across platforms.

use std::collections::BTreeSet;
use std::sync::Arc;

use ballot_store::BallotStore;
use ballot_types::{CandidateId, ElectionId, ElectionStatus, ReceiptHash, TimestampMs};
use serde::Serialize;

use crate::error::EngineError;

/// `part / whole` as a percentage string with exactly two decimals.
/// `"0.00"` when the denominator is zero.
fn percent_string(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "0.00".to_string();
    }
    let scaled = (part as u128 * 10_000 + whole as u128 / 2) / whole as u128;
    format!("{}.{:02}", scaled / 100, scaled % 100)
}

#[derive(Clone, Debug, Serialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub name: String,
    pub party: Option<String>,
    pub candidate_number: u32,
    pub vote_count: u64,
    /// Share of the election's votes, e.g. `"42.86"`.
    pub percentage: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ElectionStatistics {
    pub total_votes: u64,
    pub unique_voters: u64,
    /// Verified voter count at query time; turnout shifts as more voters
    /// are verified.
    pub eligible_voters: u64,
    pub turnout: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ElectionResults {
    pub election_id: ElectionId,
    pub title: String,
    pub status: ElectionStatus,
    pub start_date: TimestampMs,
    pub end_date: TimestampMs,
    pub results: Vec<CandidateResult>,
    pub statistics: ElectionStatistics,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecentVote {
    pub hash: ReceiptHash,
    pub election_id: ElectionId,
    pub election_title: String,
    pub cast_at: TimestampMs,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardStats {
    pub total_voters: u64,
    pub verified_voters: u64,
    pub total_elections: u64,
    pub active_elections: u64,
    pub total_votes: u64,
    pub recent_votes: Vec<RecentVote>,
}

const DASHBOARD_RECENT_VOTES: usize = 10;

pub struct ResultsAggregator<S> {
    store: Arc<S>,
}

impl<S> Clone for ResultsAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BallotStore> ResultsAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Per-candidate tallies and turnout for one election.
    ///
    /// Candidates are ordered by vote count descending, ties broken by
    /// candidate number ascending. Inactive candidates still appear:
    /// votes cast before a deactivation remain counted.
    pub fn results(&self, election_id: ElectionId) -> Result<ElectionResults, EngineError> {
        let election = self.store.get_election(election_id)?;
        let mut candidates = self.store.candidates_for_election(election_id)?;
        candidates.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.candidate_number.cmp(&b.candidate_number))
        });

        let total_votes: u64 = candidates.iter().map(|c| c.vote_count).sum();
        let results = candidates
            .into_iter()
            .map(|c| CandidateResult {
                candidate_id: c.id,
                name: c.name,
                party: c.party,
                candidate_number: c.candidate_number,
                percentage: percent_string(c.vote_count, total_votes),
                vote_count: c.vote_count,
            })
            .collect();

        let unique_voters = self
            .store
            .votes_for_election(election_id)?
            .iter()
            .map(|v| v.voter_id)
            .collect::<BTreeSet<_>>()
            .len() as u64;
        let eligible_voters = self.store.verified_voter_count()?;

        Ok(ElectionResults {
            election_id: election.id,
            title: election.title,
            status: election.status,
            start_date: election.start_date,
            end_date: election.end_date,
            results,
            statistics: ElectionStatistics {
                total_votes,
                unique_voters,
                eligible_voters,
                turnout: percent_string(total_votes, eligible_voters),
            },
        })
    }

    /// Platform-wide totals plus the latest cast activity.
    pub fn dashboard(&self) -> Result<DashboardStats, EngineError> {
        let recent = self.store.recent_votes(DASHBOARD_RECENT_VOTES)?;
        let mut recent_votes = Vec::with_capacity(recent.len());
        for vote in recent {
            let election = self.store.get_election(vote.election_id)?;
            recent_votes.push(RecentVote {
                hash: vote.hash,
                election_id: vote.election_id,
                election_title: election.title,
                cast_at: vote.cast_at,
            });
        }
        Ok(DashboardStats {
            total_voters: self.store.voter_count()?,
            verified_voters: self.store.verified_voter_count()?,
            total_elections: self.store.election_count()?,
            active_elections: self.store.active_election_count()?,
            total_votes: self.store.total_vote_count()?,
            recent_votes,
        })
    }
}
