//! Infrastructure layer for JamHub.
//!
//! Store implementations behind the `jamhub_core::store::Store` capability,
//! plus path resolution and configuration loading.

pub mod config_service;
pub mod document;
pub mod memory_store;
pub mod paths;
pub mod storage;
pub mod toml_file_store;

pub use crate::config_service::ConfigService;
pub use crate::document::DocumentTree;
pub use crate::memory_store::MemoryStore;
pub use crate::paths::JamPaths;
pub use crate::toml_file_store::TomlFileStore;
