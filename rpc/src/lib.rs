//! HTTP API for the ballot platform.
//!
//! Endpoints (all under `/api`):
//! - registration and public election listings
//! - authenticated vote casting, status, and history
//! - public receipt verification by hash
//! - admin: dashboard, voter listing/verification, election and
//!   candidate management, results

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{router, serve, AppState};
