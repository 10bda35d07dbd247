//! Transactions: a set of writes committed as one unit.

use super::path::StorePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single write against the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// Replaces the node at `path` with `value`, creating parents as needed.
    Put { path: StorePath, value: Value },
    /// Removes the node at `path` and everything below it.
    Delete { path: StorePath },
}

impl WriteOp {
    pub fn path(&self) -> &StorePath {
        match self {
            WriteOp::Put { path, .. } | WriteOp::Delete { path } => path,
        }
    }
}

/// A revision the committing store must still observe for `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precondition {
    pub path: StorePath,
    pub revision: u64,
}

/// A set of writes plus the revisions they were planned against.
///
/// Stores apply all ops or none. If any precondition no longer holds the
/// whole transaction is rejected with `JamError::TransactionConflict`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub preconditions: Vec<Precondition>,
    pub ops: Vec<WriteOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `path` at `revision`. Pinning the same path twice keeps the first.
    pub fn expect(&mut self, path: StorePath, revision: u64) -> &mut Self {
        if !self.preconditions.iter().any(|p| p.path == path) {
            self.preconditions.push(Precondition { path, revision });
        }
        self
    }

    pub fn put(&mut self, path: StorePath, value: Value) -> &mut Self {
        self.ops.push(WriteOp::Put { path, value });
        self
    }

    pub fn delete(&mut self, path: StorePath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Paths touched by this transaction, in op order.
    pub fn touched_paths(&self) -> impl Iterator<Item = &StorePath> {
        self.ops.iter().map(WriteOp::path)
    }
}
