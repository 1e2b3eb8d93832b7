//! Shared utilities for the ballot platform.

pub mod logging;

pub use logging::{init_logging, LogFormat};
