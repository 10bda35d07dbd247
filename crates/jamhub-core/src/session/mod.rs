//! Session domain module.
//!
//! - `model`: `Session` record and its roster entries

mod model;

pub use model::{RosterEntry, Session};
