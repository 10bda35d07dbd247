//! Live subscriptions over a store path.

use super::{Snapshot, Store, StorePath};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::watch;

/// A caller-owned live view of one store path.
///
/// Every commit wakes the subscription, which re-reads its path and yields
/// the snapshot only if the path's revision moved forward. Repeated or
/// stale notifications are therefore dropped, and the consumer always sees
/// the latest committed state. Dropping the handle ends the subscription.
pub struct Subscription {
    store: Arc<dyn Store>,
    path: StorePath,
    changes: watch::Receiver<u64>,
    last_revision: Option<u64>,
}

impl Subscription {
    pub fn new(store: Arc<dyn Store>, path: StorePath) -> Self {
        let changes = store.changes();
        Self {
            store,
            path,
            changes,
            last_revision: None,
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Waits for the next snapshot of the path.
    ///
    /// The first call returns the current state immediately.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: The path changed (or initial state)
    /// - `Ok(None)`: The store's change channel closed
    /// - `Err(_)`: The re-read failed
    pub async fn next(&mut self) -> Result<Option<Snapshot>> {
        if self.last_revision.is_none() {
            self.changes.borrow_and_update();
            let snapshot = self.store.read(&self.path).await?;
            self.last_revision = Some(snapshot.revision);
            return Ok(Some(snapshot));
        }

        loop {
            if self.changes.changed().await.is_err() {
                return Ok(None);
            }

            let snapshot = self.store.read(&self.path).await?;
            let last = self.last_revision.unwrap_or(0);
            if snapshot.revision > last {
                self.last_revision = Some(snapshot.revision);
                return Ok(Some(snapshot));
            }
            tracing::trace!(path = %self.path, revision = snapshot.revision, "Skipping unchanged snapshot");
        }
    }
}
