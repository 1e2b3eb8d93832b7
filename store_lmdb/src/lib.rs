//! LMDB storage backend for the ballot platform.
//!
//! Implements all storage traits from `ballot-store` using the `heed`
//! LMDB bindings. Each logical table and uniqueness index maps to one
//! named LMDB database within a single environment. The vote-casting
//! critical section runs in a single LMDB write transaction; LMDB
//! serializes writers, so the duplicate check, the vote insert, and the
//! counter increment are one atomic unit.

pub mod candidate;
pub mod election;
pub mod environment;
pub mod error;
pub mod keys;
pub mod session;
pub mod vote;
pub mod voter;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
