//! Store paths.
//!
//! A path addresses a node of the document tree as `/`-separated segments,
//! e.g. `sessions/s1/members/u1`.

use crate::error::{JamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `/`-separated address into the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorePath(String);

pub const SESSIONS: &str = "sessions";
pub const USERS: &str = "users";
pub const MEMBERS: &str = "members";
pub const INVITEES: &str = "invitees";
pub const INVITATIONS: &str = "invitations";

impl StorePath {
    /// Builds a path from raw text, dropping empty segments.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let joined = raw
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// The root of the tree.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn sessions() -> Self {
        Self::new(SESSIONS)
    }

    pub fn users() -> Self {
        Self::new(USERS)
    }

    pub fn session(session_id: &str) -> Self {
        Self::sessions().child(session_id)
    }

    pub fn session_members(session_id: &str) -> Self {
        Self::session(session_id).child(MEMBERS)
    }

    pub fn session_member(session_id: &str, user_id: &str) -> Self {
        Self::session_members(session_id).child(user_id)
    }

    pub fn session_invitees(session_id: &str) -> Self {
        Self::session(session_id).child(INVITEES)
    }

    pub fn session_invitee(session_id: &str, user_id: &str) -> Self {
        Self::session_invitees(session_id).child(user_id)
    }

    pub fn user(user_id: &str) -> Self {
        Self::users().child(user_id)
    }

    pub fn user_invitations(user_id: &str) -> Self {
        Self::user(user_id).child(INVITATIONS)
    }

    pub fn user_invitation(user_id: &str, session_id: &str) -> Self {
        Self::user_invitations(user_id).child(session_id)
    }

    /// Checks that `id` addresses exactly one record: non-empty and free of
    /// the `/` separator.
    pub fn validate_id(entity_type: &'static str, id: &str) -> Result<()> {
        if id.is_empty() || id.contains('/') {
            return Err(JamError::invalid_id(entity_type, id));
        }
        Ok(())
    }

    /// Appends one segment.
    ///
    /// The segment is taken verbatim; ids from callers go through
    /// [`StorePath::validate_id`] first.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self::new(segment)
        } else if segment.is_empty() {
            self.clone()
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the path one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Returns every proper ancestor, nearest first, ending with the root.
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out
    }

    /// True when `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &StorePath) -> bool {
        other.is_root() || self.0 == other.0 || self.0.starts_with(&format!("{}/", other.0))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for StorePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
