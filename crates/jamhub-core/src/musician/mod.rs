//! Musician domain module.
//!
//! This module contains the musician profile and the invitation mirror
//! stored under it.
//!
//! # Usage
//!
//! ```ignore
//! use jamhub_core::musician::{Invitation, Musician, ProfileUpdate};
//! ```

mod model;

pub use model::{Invitation, Musician, ProfileUpdate};
