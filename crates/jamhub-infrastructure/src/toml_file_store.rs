//! TOML file-backed store.
//!
//! The whole document tree lives in one TOML file:
//!
//! ```text
//! sequence = 12
//!
//! [write_log]
//! "sessions/s1/members/u1" = 12
//!
//! [root.sessions.s1]
//! id = "s1"
//! host_id = "h"
//! ...
//! ```
//!
//! - **Atomic**: a transaction is applied to a copy and written via tmp file + rename
//! - **Isolated**: commits hold an exclusive lock file for the read-modify-write
//! - **Async-safe**: all file I/O runs on `tokio::task::spawn_blocking`
//! - **Shared**: a background poller publishes commits made by other
//!   processes on the same file

use crate::document::DocumentTree;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use jamhub_core::store::{Snapshot, Store, StorePath, Transaction};
use jamhub_core::{JamError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Default interval between checks for outside commits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct TomlFileStore {
    file: Arc<AtomicTomlFile<DocumentTree>>,
    changes: Arc<watch::Sender<u64>>,
    poll_interval: Duration,
    poller_started: AtomicBool,
    shutdown: CancellationToken,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_poll_interval(path, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            file: Arc::new(AtomicTomlFile::new(path.into())),
            changes: Arc::new(changes),
            poll_interval,
            poller_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn load_sync(file: &AtomicTomlFile<DocumentTree>) -> Result<DocumentTree> {
        Ok(file.load()?.unwrap_or_default())
    }

    async fn load(&self) -> Result<DocumentTree> {
        let file = Arc::clone(&self.file);
        task::spawn_blocking(move || Self::load_sync(&file))
            .await
            .map_err(|e| JamError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    /// Starts the outside-commit poller on first use. Without a running
    /// tokio runtime only this instance's own commits are published.
    fn ensure_poller(&self) {
        if self.poller_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.poller_started.store(false, Ordering::SeqCst);
            tracing::debug!(path = %self.path().display(), "No runtime, file poller not started");
            return;
        };

        runtime.spawn(poll_file(
            Arc::clone(&self.file),
            Arc::clone(&self.changes),
            self.poll_interval,
            self.shutdown.clone(),
        ));
        tracing::debug!(
            path = %self.path().display(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "File poller started"
        );
    }
}

impl Drop for TomlFileStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl Store for TomlFileStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot> {
        Ok(self.load().await?.snapshot(path))
    }

    async fn list(&self, path: &StorePath) -> Result<Vec<(String, Snapshot)>> {
        Ok(self.load().await?.children(path))
    }

    async fn transactional_write(&self, transaction: Transaction) -> Result<()> {
        if transaction.is_empty() {
            return Ok(());
        }

        let file = Arc::clone(&self.file);
        let sequence = task::spawn_blocking(move || {
            file.update(DocumentTree::new(), |tree| tree.apply(&transaction))
        })
        .await
        .map_err(|e| JamError::io(format!("Failed to spawn blocking task: {}", e)))??;

        tracing::debug!(path = %self.path().display(), sequence, "Committed transaction to file");
        publish(&self.changes, sequence);
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.ensure_poller();
        self.changes.subscribe()
    }
}

fn publish(changes: &watch::Sender<u64>, sequence: u64) {
    changes.send_if_modified(|current| {
        if *current == sequence {
            false
        } else {
            *current = sequence;
            true
        }
    });
}

/// Returns the file's modification time and commit sequence, or `None` when
/// the file is missing or unchanged since `seen`.
fn read_if_modified(
    file: &AtomicTomlFile<DocumentTree>,
    seen: Option<SystemTime>,
) -> Result<Option<(SystemTime, u64)>> {
    let modified = match std::fs::metadata(file.path()) {
        Ok(metadata) => metadata.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if seen == Some(modified) {
        return Ok(None);
    }
    let sequence = file.load()?.map(|tree| tree.sequence).unwrap_or(0);
    Ok(Some((modified, sequence)))
}

async fn poll_file(
    file: Arc<AtomicTomlFile<DocumentTree>>,
    changes: Arc<watch::Sender<u64>>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seen: Option<SystemTime> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let file = Arc::clone(&file);
        match task::spawn_blocking(move || read_if_modified(&file, seen)).await {
            Ok(Ok(Some((modified, sequence)))) => {
                seen = Some(modified);
                publish(&changes, sequence);
            }
            Ok(Ok(None)) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "Failed to poll store file"),
            Err(err) => {
                tracing::error!(error = %err, "File poller task failed");
                break;
            }
        }
    }
    tracing::debug!("File poller stopped");
}
