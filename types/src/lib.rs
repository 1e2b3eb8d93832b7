//! Fundamental types for the ballot platform.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: entity identifiers, timestamps, receipt hashes, and status enums.

pub mod id;
pub mod receipt;
pub mod status;
pub mod time;

pub use id::{CandidateId, ElectionId, VoterId};
pub use receipt::ReceiptHash;
pub use status::{ElectionStatus, VoterRole};
pub use time::TimestampMs;
