//! Live membership view.
//!
//! Replaces ad hoc database observers with one caller-owned handle: a
//! background task subscribes to the session record, feeds every new
//! snapshot through the pure resolver, and publishes the result. Dropping
//! the handle cancels the task.

use jamhub_core::membership::{MembershipState, MembershipView};
use jamhub_core::session::Session;
use jamhub_core::store::{Store, StorePath, Subscription};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A change published by a [`MembershipWatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipUpdate {
    View(MembershipView),
    /// The session record no longer exists
    SessionEnded,
}

pub struct MembershipWatch {
    updates: watch::Receiver<Option<MembershipUpdate>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MembershipWatch {
    pub(crate) fn spawn(store: Arc<dyn Store>, user_id: &str, session_id: &str) -> Self {
        let (sender, updates) = watch::channel(None);
        let cancel = CancellationToken::new();

        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        let subscription = Subscription::new(store, StorePath::session(&session_id));
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            run(subscription, sender, token, user_id, session_id).await;
        });

        Self {
            updates,
            cancel,
            task: Some(task),
        }
    }

    /// The most recent update, if one has been published.
    pub fn current(&self) -> Option<MembershipUpdate> {
        self.updates.borrow().clone()
    }

    /// Waits for the next distinct update.
    ///
    /// Returns `None` once the watch has stopped (cancelled, session channel
    /// closed, or a read failed).
    pub async fn next(&mut self) -> Option<MembershipUpdate> {
        loop {
            self.updates.changed().await.ok()?;
            if let Some(update) = self.updates.borrow_and_update().clone() {
                return Some(update);
            }
        }
    }

    /// Stops the background task and waits for it to finish.
    pub async fn cancel(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MembershipWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut subscription: Subscription,
    sender: watch::Sender<Option<MembershipUpdate>>,
    cancel: CancellationToken,
    user_id: String,
    session_id: String,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = subscription.next() => next,
        };

        let snapshot = match next {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "Membership watch stopped");
                break;
            }
        };

        let update = match snapshot.decode::<Session>() {
            Ok(Some(session)) => {
                let state = MembershipState::of(&user_id, &session);
                MembershipUpdate::View(MembershipView::new(&session_id, &user_id, state))
            }
            Ok(None) => MembershipUpdate::SessionEnded,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "Undecodable session snapshot");
                continue;
            }
        };

        // Identical resolutions are not republished
        sender.send_if_modified(|current| {
            if current.as_ref() == Some(&update) {
                false
            } else {
                *current = Some(update);
                true
            }
        });
    }
    tracing::debug!(%session_id, %user_id, "Membership watch finished");
}
