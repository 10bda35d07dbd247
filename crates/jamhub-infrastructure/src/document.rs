//! In-memory document tree shared by the store implementations.
//!
//! The tree is a JSON object addressed by [`StorePath`]. Alongside the data it
//! keeps a write log mapping every directly written path to the commit
//! sequence number that last touched it. The revision of a path is the
//! highest sequence number of any write at, above or below it, which is
//! exactly the set of writes that could have changed what a read of the path
//! returns.

use jamhub_core::store::{Snapshot, StorePath, Transaction, WriteOp};
use jamhub_core::{JamError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// The whole database: data, write log and commit sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    /// Number of committed transactions
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    write_log: BTreeMap<String, u64>,
    #[serde(default = "empty_object")]
    root: Value,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self {
            sequence: 0,
            write_log: BTreeMap::new(),
            root: empty_object(),
        }
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored at `path`, if any.
    pub fn get(&self, path: &StorePath) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Highest commit sequence that wrote at, above or below `path`.
    pub fn revision(&self, path: &StorePath) -> u64 {
        let above = path
            .ancestors()
            .iter()
            .filter_map(|a| self.write_log.get(a.as_str()).copied())
            .max()
            .unwrap_or(0);
        let at_or_below = self
            .write_log
            .iter()
            .filter(|(written, _)| StorePath::new(written.as_str()).starts_with(path))
            .map(|(_, seq)| *seq)
            .max()
            .unwrap_or(0);
        above.max(at_or_below)
    }

    pub fn snapshot(&self, path: &StorePath) -> Snapshot {
        Snapshot {
            value: self.get(path).cloned(),
            revision: self.revision(path),
        }
    }

    /// Direct children of `path`, sorted by key.
    pub fn children(&self, path: &StorePath) -> Vec<(String, Snapshot)> {
        let Some(Value::Object(map)) = self.get(path) else {
            return Vec::new();
        };
        map.iter()
            .map(|(key, value)| {
                let child = path.child(key);
                let snapshot = Snapshot {
                    value: Some(value.clone()),
                    revision: self.revision(&child),
                };
                (key.clone(), snapshot)
            })
            .collect()
    }

    /// Number of paths recorded in the write log.
    pub fn logged_paths(&self) -> usize {
        self.write_log.len()
    }

    /// Drops log entries strictly below `path`. The write about to be logged
    /// at `path` outranks them for every revision they contributed to.
    fn prune_below(&mut self, path: &StorePath) {
        if path.is_root() {
            self.write_log.clear();
            return;
        }
        let prefix = format!("{}/", path.as_str());
        self.write_log.retain(|written, _| !written.starts_with(&prefix));
    }

    /// Validates preconditions and applies every op, or nothing.
    ///
    /// Returns the new commit sequence number.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<u64> {
        for precondition in &transaction.preconditions {
            let current = self.revision(&precondition.path);
            if current != precondition.revision {
                tracing::debug!(
                    path = %precondition.path,
                    expected = precondition.revision,
                    current,
                    "Precondition failed"
                );
                return Err(JamError::conflict(precondition.path.to_string()));
            }
        }

        let mut root = self.root.clone();
        for op in &transaction.ops {
            match op {
                WriteOp::Put { path, value } => put(&mut root, path, value.clone())?,
                WriteOp::Delete { path } => delete(&mut root, path),
            }
        }

        let sequence = self.sequence + 1;
        for path in transaction.touched_paths() {
            self.prune_below(path);
        }
        for path in transaction.touched_paths() {
            self.write_log.insert(path.as_str().to_string(), sequence);
        }
        self.root = root;
        self.sequence = sequence;
        Ok(sequence)
    }
}

fn put(root: &mut Value, path: &StorePath, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        if !value.is_object() {
            return Err(JamError::data_access("root must be an object"));
        }
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for segment in parents {
        let map = node.as_object_mut().ok_or_else(|| {
            JamError::data_access(format!("cannot write below a scalar at '{}'", path))
        })?;
        node = map.entry(segment.to_string()).or_insert_with(empty_object);
    }

    let map = node.as_object_mut().ok_or_else(|| {
        JamError::data_access(format!("cannot write below a scalar at '{}'", path))
    })?;
    map.insert(last.to_string(), value);
    Ok(())
}

fn delete(root: &mut Value, path: &StorePath) {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        *root = empty_object();
        return;
    };

    let mut node = root;
    for segment in parents {
        match node.as_object_mut().and_then(|m| m.get_mut(*segment)) {
            Some(child) => node = child,
            None => return,
        }
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(*last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> DocumentTree {
        let mut tree = DocumentTree::new();
        let mut tx = Transaction::new();
        tx.put(StorePath::session("s1"), json!({"id": "s1", "members": {}}))
            .put(StorePath::user("u1"), json!({"id": "u1"}));
        tree.apply(&tx).unwrap();
        tree
    }

    #[test]
    fn test_put_creates_parents() {
        let tree = seeded();
        assert_eq!(tree.get(&StorePath::new("sessions/s1/id")), Some(&json!("s1")));
        assert_eq!(tree.sequence, 1);
    }

    #[test]
    fn test_revision_tracks_descendant_and_ancestor_writes() {
        let mut tree = seeded();
        let members = StorePath::session_members("s1");
        assert_eq!(tree.revision(&members), 1);

        let mut tx = Transaction::new();
        tx.put(StorePath::session_member("s1", "u1"), json!({"musician_id": "u1"}));
        tree.apply(&tx).unwrap();
        assert_eq!(tree.revision(&StorePath::session("s1")), 2);
        assert_eq!(tree.revision(&members), 2);
        // Sibling record unaffected
        assert_eq!(tree.revision(&StorePath::user("u1")), 1);

        let mut tx = Transaction::new();
        tx.delete(StorePath::session("s1"));
        tree.apply(&tx).unwrap();
        assert_eq!(tree.revision(&members), 3);
        assert!(tree.get(&members).is_none());
    }

    #[test]
    fn test_stale_precondition_rejects_whole_transaction() {
        let mut tree = seeded();
        let mut tx = Transaction::new();
        tx.expect(StorePath::user("u1"), 0)
            .put(StorePath::new("users/u1/name"), json!("Ada"));

        let err = tree.apply(&tx).unwrap_err();
        assert!(err.is_conflict());
        assert!(tree.get(&StorePath::new("users/u1/name")).is_none());
        assert_eq!(tree.sequence, 1);
    }

    #[test]
    fn test_failed_op_leaves_tree_untouched() {
        let mut tree = seeded();
        let mut tx = Transaction::new();
        tx.put(StorePath::new("users/u1/name"), json!("Ada"))
            .put(StorePath::new("users/u1/id/nested"), json!(true));

        assert!(tree.apply(&tx).is_err());
        assert!(tree.get(&StorePath::new("users/u1/name")).is_none());
    }

    #[test]
    fn test_delete_missing_path_is_noop() {
        let mut tree = seeded();
        let mut tx = Transaction::new();
        tx.delete(StorePath::user_invitation("nobody", "s1"));
        tree.apply(&tx).unwrap();
        assert!(tree.get(&StorePath::users().child("nobody")).is_none());
    }

    #[test]
    fn test_children_sorted_with_revisions() {
        let tree = seeded();
        let children = tree.children(&StorePath::root());
        let keys: Vec<&str> = children.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["sessions", "users"]);
        assert!(children.iter().all(|(_, s)| s.revision == 1));
    }

    #[test]
    fn test_write_log_pruned_below_rewritten_paths() {
        let mut tree = seeded();
        let mut tx = Transaction::new();
        tx.put(StorePath::session_member("s1", "u1"), json!({"musician_id": "u1"}))
            .put(StorePath::new("users/u1/session_count"), json!(1));
        tree.apply(&tx).unwrap();
        let mut tx = Transaction::new();
        tx.put(StorePath::session_invitee("s1", "u2"), json!({"musician_id": "u2"}))
            .put(StorePath::user_invitation("u2", "s1"), json!({"session_id": "s1"}));
        tree.apply(&tx).unwrap();
        assert_eq!(tree.logged_paths(), 6);

        // End the session, then delete u1
        let mut tx = Transaction::new();
        tx.delete(StorePath::session("s1"))
            .delete(StorePath::user_invitation("u2", "s1"));
        tree.apply(&tx).unwrap();
        let mut tx = Transaction::new();
        tx.delete(StorePath::user("u1"));
        tree.apply(&tx).unwrap();

        let logged: Vec<&str> = tree.write_log.keys().map(String::as_str).collect();
        assert_eq!(logged, vec!["sessions/s1", "users/u1", "users/u2/invitations/s1"]);
        // Revisions below pruned entries still come from the deleting write
        assert_eq!(tree.revision(&StorePath::session_member("s1", "u1")), 4);
        assert_eq!(tree.revision(&StorePath::new("users/u1/session_count")), 5);
        assert_eq!(tree.revision(&StorePath::users()), 5);
    }

    #[test]
    fn test_write_log_stays_bounded_across_repeated_cycles() {
        let mut tree = DocumentTree::new();
        let mut sizes = Vec::new();
        for _ in 0..5 {
            let mut tx = Transaction::new();
            tx.put(StorePath::session("s"), json!({"id": "s"}))
                .put(StorePath::user("u"), json!({"id": "u"}));
            tree.apply(&tx).unwrap();
            let mut tx = Transaction::new();
            tx.put(StorePath::session_member("s", "u"), json!({"musician_id": "u"}))
                .put(StorePath::new("users/u/session_count"), json!(1));
            tree.apply(&tx).unwrap();
            let mut tx = Transaction::new();
            tx.delete(StorePath::session("s")).delete(StorePath::user("u"));
            tree.apply(&tx).unwrap();
            sizes.push(tree.logged_paths());
        }
        assert!(sizes.iter().all(|&n| n == 2), "{:?}", sizes);
    }
}
