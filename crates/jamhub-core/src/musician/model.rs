//! Musician domain model.
//!
//! Represents a user's musician profile and the invitations mirrored under it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Musician profile.
///
/// One profile per user id. `invitations` mirrors every session invitee
/// record that names this musician, keyed by session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Musician {
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub instruments: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    /// Reference to the uploaded profile image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    /// Number of sessions joined
    #[serde(default)]
    pub session_count: u32,
    /// Name of the most recently joined session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session: Option<String>,
    #[serde(default)]
    pub invitations: BTreeMap<String, Invitation>,
}

impl Musician {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instruments: String::new(),
            genres: String::new(),
            city: String::new(),
            country: String::new(),
            profile_image_url: None,
            session_count: 0,
            last_session: None,
            invitations: BTreeMap::new(),
        }
    }

    /// "City, Country" as shown on the profile screen.
    pub fn location(&self) -> String {
        match (self.city.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.country),
            (false, true) => self.city.clone(),
            (true, false) => self.country.clone(),
            (true, true) => String::new(),
        }
    }

    pub fn is_invited_to(&self, session_id: &str) -> bool {
        self.invitations.contains_key(session_id)
    }
}

/// Mirror of a session invitee record, stored under the invited musician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub session_id: String,
    pub session_name: String,
    pub host_id: String,
    /// RFC 3339 timestamp of the invitation
    pub invited_at: String,
}

/// A profile edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub instruments: Option<String>,
    pub genres: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub profile_image_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.instruments.is_none()
            && self.genres.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.profile_image_url.is_none()
    }

    /// Applies the edit, returning true if any field changed.
    pub fn apply_to(&self, musician: &mut Musician) -> bool {
        let before = musician.clone();
        if let Some(name) = &self.name {
            musician.name = name.clone();
        }
        if let Some(instruments) = &self.instruments {
            musician.instruments = instruments.clone();
        }
        if let Some(genres) = &self.genres {
            musician.genres = genres.clone();
        }
        if let Some(city) = &self.city {
            musician.city = city.clone();
        }
        if let Some(country) = &self.country {
            musician.country = country.clone();
        }
        if let Some(url) = &self.profile_image_url {
            musician.profile_image_url = Some(url.clone());
        }
        *musician != before
    }
}
