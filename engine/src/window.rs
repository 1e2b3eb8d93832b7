//! Election window evaluator.
//!
//! Voting is admitted only when two independent conditions both hold:
//! the admin-set status label is `Active`, and the current instant lies
//! within the published `[start, end]` window (inclusive on both ends).
//! The double check is deliberate: status reflects administrator intent,
//! the window reflects the published schedule. An election whose status
//! was never flipped does not accept votes inside its window, and an
//! active-labelled election does not accept votes outside it.

use ballot_store::election::ElectionRecord;
use ballot_types::{ElectionStatus, TimestampMs};

use crate::error::EngineError;

/// Whether the election currently admits votes.
pub fn is_open(election: &ElectionRecord, now: TimestampMs) -> bool {
    election.status == ElectionStatus::Active
        && now.within(election.start_date, election.end_date)
}

/// Enforce the window, rejecting with `VotingClosed`.
pub fn ensure_open(election: &ElectionRecord, now: TimestampMs) -> Result<(), EngineError> {
    if is_open(election, now) {
        Ok(())
    } else {
        Err(EngineError::VotingClosed)
    }
}
