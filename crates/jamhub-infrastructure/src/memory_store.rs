//! Process-local store.

use crate::document::DocumentTree;
use async_trait::async_trait;
use jamhub_core::Result;
use jamhub_core::store::{Snapshot, Store, StorePath, Transaction};
use serde::Serialize;
use tokio::sync::{RwLock, watch};

/// A [`Store`] holding the document tree in memory.
///
/// Transactions are serialized by the write lock, so a commit is atomic with
/// respect to every other reader and writer in the process.
pub struct MemoryStore {
    tree: RwLock<DocumentTree>,
    changes: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_document(DocumentTree::new())
    }

    pub fn with_document(tree: DocumentTree) -> Self {
        let (changes, _) = watch::channel(tree.sequence);
        Self {
            tree: RwLock::new(tree),
            changes,
        }
    }

    /// Writes a record without preconditions, as a host action or fixture would.
    pub async fn seed<T: Serialize>(&self, path: StorePath, record: &T) -> Result<()> {
        let mut tx = Transaction::new();
        tx.put(path, serde_json::to_value(record)?);
        self.transactional_write(tx).await
    }

    /// Copy of the current tree.
    pub async fn document(&self) -> DocumentTree {
        self.tree.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot> {
        Ok(self.tree.read().await.snapshot(path))
    }

    async fn list(&self, path: &StorePath) -> Result<Vec<(String, Snapshot)>> {
        Ok(self.tree.read().await.children(path))
    }

    async fn transactional_write(&self, transaction: Transaction) -> Result<()> {
        if transaction.is_empty() {
            return Ok(());
        }

        let sequence = {
            let mut tree = self.tree.write().await;
            tree.apply(&transaction)?
        };

        tracing::trace!(sequence, ops = transaction.ops.len(), "Committed transaction");
        self.changes.send_replace(sequence);
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
