//! Session domain model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A live jam session.
///
/// The session owns its roster: the `members` and `invitees` maps are keyed
/// by musician id, so a musician appears at most once in each. Membership
/// operations keep the two maps disjoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Display name, also recorded as a musician's "last session"
    pub name: String,
    /// The musician who created the session
    pub host_id: String,
    /// Human-readable start time as entered by the host
    pub start_time: String,
    pub location: String,
    pub genre: String,
    /// Code a stranger must supply to join
    pub join_code: String,
    #[serde(default)]
    pub members: BTreeMap<String, RosterEntry>,
    #[serde(default)]
    pub invitees: BTreeMap<String, RosterEntry>,
}

/// A membership record under `members` or `invitees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub musician_id: String,
    /// RFC 3339 timestamp of when the record was written
    pub since: String,
}

impl RosterEntry {
    pub fn new(musician_id: impl Into<String>, since: impl Into<String>) -> Self {
        Self {
            musician_id: musician_id.into(),
            since: since.into(),
        }
    }
}

impl Session {
    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains_key(user_id)
    }

    pub fn is_invitee(&self, user_id: &str) -> bool {
        self.invitees.contains_key(user_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    pub fn invitee_ids(&self) -> Vec<String> {
        self.invitees.keys().cloned().collect()
    }

    /// Musician ids listed as both member and invitee. Always empty for a
    /// roster maintained through the membership operations.
    pub fn overlapping_ids(&self) -> Vec<String> {
        self.members
            .keys()
            .filter(|id| self.invitees.contains_key(*id))
            .cloned()
            .collect()
    }
}
