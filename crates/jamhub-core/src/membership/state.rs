//! Membership resolution.

use crate::session::Session;
use serde::{Deserialize, Serialize};

/// A user's relationship to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Host,
    Member,
    Invited,
    Stranger,
}

/// Determines how `user_id` relates to `session`.
///
/// `members` and `invitees` are the session's roster as currently known to
/// the caller, typically from live subscriptions. Evaluation order is host,
/// then member, then invitee; the host wins even when the roster also lists
/// them. The result depends only on the inputs, so repeated or duplicated
/// deliveries of the same roster resolve identically.
pub fn resolve_membership<S: AsRef<str>>(
    user_id: &str,
    session: &Session,
    members: &[S],
    invitees: &[S],
) -> MembershipState {
    if session.host_id == user_id {
        MembershipState::Host
    } else if members.iter().any(|m| m.as_ref() == user_id) {
        MembershipState::Member
    } else if invitees.iter().any(|i| i.as_ref() == user_id) {
        MembershipState::Invited
    } else {
        MembershipState::Stranger
    }
}

impl MembershipState {
    /// Resolves against the roster embedded in the session record.
    pub fn of(user_id: &str, session: &Session) -> Self {
        resolve_membership(
            user_id,
            session,
            &session.member_ids(),
            &session.invitee_ids(),
        )
    }

    /// True for the states that already grant access to the session.
    pub fn is_participant(self) -> bool {
        matches!(self, MembershipState::Host | MembershipState::Member)
    }
}
