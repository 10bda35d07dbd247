//! Store capability.
//!
//! The membership core never talks to a database directly. It consumes an
//! injected [`Store`]: point reads, child listings, atomic transactional
//! writes and a commit-sequence channel that drives live subscriptions.
//!
//! # Module Structure
//!
//! - `path`: `StorePath` addressing and the fixed record layout
//! - `transaction`: `Transaction`, `WriteOp`, `Precondition`
//! - `subscription`: caller-owned live `Subscription` handles

mod path;
mod subscription;
mod transaction;

pub use path::StorePath;
pub use subscription::Subscription;
pub use transaction::{Precondition, Transaction, WriteOp};

use crate::error::{JamError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

/// The value of a node at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// `None` when nothing is stored at the path
    pub value: Option<Value>,
    /// Bumped on every committed write at or below the path; 0 if never written
    pub revision: u64,
}

impl Snapshot {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Deserializes the node into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.value {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

/// A decoded record together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub revision: u64,
}

impl<T> Versioned<T> {
    pub fn new(record: T, revision: u64) -> Self {
        Self { record, revision }
    }
}

/// An abstract document store.
///
/// This trait decouples the membership logic from the backing storage
/// (in-memory tree, TOML file, remote realtime database).
///
/// # Implementation Notes
///
/// Implementations must:
/// - Apply a [`Transaction`] atomically: every op or none
/// - Reject a transaction whose preconditions no longer hold with
///   [`JamError::TransactionConflict`]
/// - Bump the revision of every written path and all of its ancestors
/// - Publish a new commit sequence number through [`Store::changes`] after
///   each successful commit
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the node at `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(Snapshot)`: `snapshot.value` is `None` if the path is missing
    /// - `Err(_)`: Error occurred during retrieval
    async fn read(&self, path: &StorePath) -> Result<Snapshot>;

    /// Lists the direct children of `path` as `(key, snapshot)` pairs,
    /// sorted by key. A missing path has no children.
    async fn list(&self, path: &StorePath) -> Result<Vec<(String, Snapshot)>>;

    /// Commits `transaction` as one atomic unit.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: All ops applied
    /// - `Err(JamError::TransactionConflict)`: A pinned revision changed
    /// - `Err(_)`: Storage failure, nothing applied
    async fn transactional_write(&self, transaction: Transaction) -> Result<()>;

    /// Returns a receiver of the store's commit sequence number.
    fn changes(&self) -> watch::Receiver<u64>;
}

/// Typed helpers layered over any [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    /// Reads and decodes a record, failing with `NotFound` if it is missing.
    async fn require<T>(
        &self,
        path: &StorePath,
        entity_type: &'static str,
        id: &str,
    ) -> Result<Versioned<T>>
    where
        T: DeserializeOwned + Send,
    {
        let snapshot = self.read(path).await?;
        match snapshot.decode::<T>()? {
            Some(record) => Ok(Versioned::new(record, snapshot.revision)),
            None => Err(JamError::not_found(entity_type, id)),
        }
    }

    /// Reads and decodes every child of a collection, skipping missing nodes.
    async fn list_records<T>(&self, path: &StorePath) -> Result<Vec<Versioned<T>>>
    where
        T: DeserializeOwned + Send,
    {
        let mut records = Vec::new();
        for (_, snapshot) in self.list(path).await? {
            if let Some(record) = snapshot.decode::<T>()? {
                records.push(Versioned::new(record, snapshot.revision));
            }
        }
        Ok(records)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
