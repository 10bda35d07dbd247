use serde::{Deserialize, Serialize};

/// Result of a mutating membership operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The writes were committed
    Applied,
    /// The user already belongs to the session; nothing was written
    AlreadyMember,
    /// The musician already holds an invitation; nothing was written
    AlreadyInvited,
    /// The edit matched the stored values; nothing was written
    Unchanged,
    /// The invitation was no longer open on the session; its leftover copy
    /// under the musician was removed and no membership was granted
    InvitationWithdrawn,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == MutationOutcome::Applied
    }
}

/// What an account deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub user_id: String,
    /// Sessions hosted by the user, deleted entirely
    pub sessions_deleted: Vec<String>,
    /// Sessions the user was removed from as a member
    pub memberships_removed: Vec<String>,
    /// Sessions the user was removed from as an invitee
    pub invitations_removed: Vec<String>,
}

impl DeletionReport {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}
