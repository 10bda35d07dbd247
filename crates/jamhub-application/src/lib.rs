//! Application layer for JamHub.
//!
//! This crate coordinates the pure membership planners in `jamhub-core`
//! with an injected store: transactional commits with timeout and bounded
//! conflict retry, and live membership views.

pub mod membership_usecase;
pub mod membership_watch;

pub use membership_usecase::MembershipUseCase;
pub use membership_watch::{MembershipUpdate, MembershipWatch};
