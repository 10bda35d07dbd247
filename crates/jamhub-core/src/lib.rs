//! Core domain layer for JamHub.
//!
//! Sessions, musician profiles, the membership resolver and the store
//! capability the rest of the workspace is written against. Nothing in this
//! crate performs I/O.

pub mod config;
pub mod error;
pub mod membership;
pub mod musician;
pub mod session;
pub mod store;

// Re-export common error type
pub use error::{JamError, Result};
