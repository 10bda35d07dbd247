//! Membership lifecycle.
//!
//! A user is a stranger, an invitee, a member or the host of a session.
//! This module resolves that relationship, derives the join control from
//! it, and plans the transactions that move a user between states.
//!
//! # Module Structure
//!
//! - `state`: `MembershipState` and the pure `resolve_membership` function
//! - `affordance`: `JoinAffordance`, `JoinAction`, `MembershipView`
//! - `outcome`: `MutationOutcome`, `DeletionReport`
//! - `planner`: pure transaction planners for every mutating operation

mod affordance;
mod outcome;
pub mod planner;
mod state;

pub use affordance::{
    JoinAction, JoinAffordance, LABEL_ACCEPT_INVITATION, LABEL_JOIN_SESSION, LABEL_VIEW_MEDIA,
    MembershipView,
};
pub use outcome::{DeletionReport, MutationOutcome};
pub use planner::Planned;
pub use state::{MembershipState, resolve_membership};
