//! The "join" control derived from a membership state.

use super::state::MembershipState;
use serde::{Deserialize, Serialize};

pub const LABEL_VIEW_MEDIA: &str = "View Media";
pub const LABEL_ACCEPT_INVITATION: &str = "Accept Invitation";
pub const LABEL_JOIN_SESSION: &str = "Join Session";

/// What activating the join control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinAction {
    OpenSessionManagement,
    OpenSessionMedia,
    AcceptInvitation,
    /// Ask for the join code, then run `join_by_code` if it matches
    PromptForJoinCode,
}

/// Label and behaviour of the join control, plus the host-only controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAffordance {
    pub label: String,
    pub action: JoinAction,
    /// "Manage" is enabled only for the host
    pub can_manage: bool,
    /// "Invite musicians" is shown only to the host
    pub can_invite: bool,
}

impl JoinAffordance {
    pub fn for_state(state: MembershipState) -> Self {
        let (label, action) = match state {
            MembershipState::Host => (LABEL_VIEW_MEDIA, JoinAction::OpenSessionManagement),
            MembershipState::Member => (LABEL_VIEW_MEDIA, JoinAction::OpenSessionMedia),
            MembershipState::Invited => (LABEL_ACCEPT_INVITATION, JoinAction::AcceptInvitation),
            MembershipState::Stranger => (LABEL_JOIN_SESSION, JoinAction::PromptForJoinCode),
        };
        let is_host = state == MembershipState::Host;

        Self {
            label: label.to_string(),
            action,
            can_manage: is_host,
            can_invite: is_host,
        }
    }
}

/// A user's resolved relationship to one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipView {
    pub session_id: String,
    pub user_id: String,
    pub state: MembershipState,
    pub affordance: JoinAffordance,
}

impl MembershipView {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>, state: MembershipState) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            state,
            affordance: JoinAffordance::for_state(state),
        }
    }
}
