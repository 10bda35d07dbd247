//! Membership use case implementation.
//!
//! This module provides the `MembershipUseCase`, which reads the records an
//! operation needs, hands them to the pure planners in
//! `jamhub_core::membership::planner`, and commits the planned transaction
//! against the injected store.

use crate::membership_watch::MembershipWatch;
use jamhub_core::config::MembershipSettings;
use jamhub_core::membership::planner;
use jamhub_core::membership::{
    DeletionReport, MembershipState, MembershipView, MutationOutcome, Planned,
};
use jamhub_core::musician::{Invitation, Musician, ProfileUpdate};
use jamhub_core::session::Session;
use jamhub_core::store::{Store, StoreExt, StorePath, Transaction, Versioned};
use jamhub_core::{JamError, Result};
use std::future::Future;
use std::sync::Arc;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Rejects ids that cannot address a single record before any read or write.
fn validate_ids(ids: &[(&'static str, &str)]) -> Result<()> {
    for &(entity_type, id) in ids {
        StorePath::validate_id(entity_type, id)?;
    }
    Ok(())
}

/// Use case for the session-membership and invitation lifecycle.
///
/// # Responsibilities
///
/// - Resolving a user's relationship to a session and the join control
/// - Running every mutating operation as one store transaction
/// - Bounding each commit with the configured write timeout
/// - Retrying, up to `conflict_retries` times, operations whose commit hit a
///   `TransactionConflict`; each retry re-reads and re-plans from scratch
///
/// Every other failure is returned to the caller unchanged.
pub struct MembershipUseCase {
    store: Arc<dyn Store>,
    settings: MembershipSettings,
}

impl MembershipUseCase {
    pub fn new(store: Arc<dyn Store>, settings: MembershipSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> &MembershipSettings {
        &self.settings
    }

    // ============================================================================
    // Reads
    // ============================================================================

    async fn load_session(&self, session_id: &str) -> Result<Versioned<Session>> {
        StorePath::validate_id("session", session_id)?;
        self.store
            .require(&StorePath::session(session_id), "session", session_id)
            .await
    }

    async fn load_musician(&self, user_id: &str) -> Result<Versioned<Musician>> {
        StorePath::validate_id("musician", user_id)?;
        self.store
            .require(&StorePath::user(user_id), "musician", user_id)
            .await
    }

    pub async fn session(&self, session_id: &str) -> Result<Session> {
        Ok(self.load_session(session_id).await?.record)
    }

    pub async fn musician(&self, user_id: &str) -> Result<Musician> {
        Ok(self.load_musician(user_id).await?.record)
    }

    pub async fn sessions(&self) -> Result<Vec<Session>> {
        let sessions = self
            .store
            .list_records::<Session>(&StorePath::sessions())
            .await?;
        Ok(sessions.into_iter().map(|s| s.record).collect())
    }

    /// Resolves `user_id` against the session's current roster.
    pub async fn membership_view(&self, user_id: &str, session_id: &str) -> Result<MembershipView> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        let session = self.session(session_id).await?;
        let state = MembershipState::of(user_id, &session);
        tracing::debug!(user_id, session_id, ?state, "Resolved membership");
        Ok(MembershipView::new(session_id, user_id, state))
    }

    /// Pending invitations mirrored under the musician's profile.
    pub async fn invitations(&self, user_id: &str) -> Result<Vec<Invitation>> {
        Ok(self.musician(user_id).await?.invitations.into_values().collect())
    }

    /// Opens a live view of `user_id`'s membership in `session_id`.
    pub fn watch_membership(&self, user_id: &str, session_id: &str) -> Result<MembershipWatch> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        Ok(MembershipWatch::spawn(Arc::clone(&self.store), user_id, session_id))
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Joins a session with its join code.
    ///
    /// # Returns
    ///
    /// - `Ok(Applied)`: The user is now a member
    /// - `Ok(AlreadyMember)`: The user is the host or already a member
    /// - `Err(InvalidCode)`: Wrong code; nothing was written
    /// - `Err(NotFound)`: Session or musician missing
    pub async fn join_by_code(
        &self,
        user_id: &str,
        session_id: &str,
        code: &str,
    ) -> Result<MutationOutcome> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        let outcome = self
            .run("join_by_code", move || async move {
                let user = self.load_musician(user_id).await?;
                let session = self.load_session(session_id).await?;
                planner::plan_join_by_code(&user, &session, code, &now())
            })
            .await;
        log_outcome("join_by_code", user_id, session_id, &outcome);
        outcome
    }

    /// Accepts a pending invitation, consuming both copies of it.
    pub async fn accept_invitation(&self, user_id: &str, session_id: &str) -> Result<MutationOutcome> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        let outcome = self
            .run("accept_invitation", move || async move {
                let user = self.load_musician(user_id).await?;
                let session = self.load_session(session_id).await?;
                planner::plan_accept_invitation(&user, &session, &now())
            })
            .await;
        log_outcome("accept_invitation", user_id, session_id, &outcome);
        outcome
    }

    /// Declines a pending invitation on behalf of the invitee.
    pub async fn decline_invitation(&self, user_id: &str, session_id: &str) -> Result<MutationOutcome> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        let outcome = self
            .run("decline_invitation", move || async move {
                let user = self.load_musician(user_id).await?;
                let session = self.load_session(session_id).await?;
                planner::plan_decline_invitation(&user, &session)
            })
            .await;
        log_outcome("decline_invitation", user_id, session_id, &outcome);
        outcome
    }

    /// Invites a musician. Only the host may invite.
    pub async fn invite_musician(
        &self,
        host_id: &str,
        session_id: &str,
        invitee_id: &str,
    ) -> Result<MutationOutcome> {
        validate_ids(&[("musician", host_id), ("session", session_id), ("musician", invitee_id)])?;
        let outcome = self
            .run("invite_musician", move || async move {
                let session = self.load_session(session_id).await?;
                let invitee = self.load_musician(invitee_id).await?;
                planner::plan_invite(host_id, &session, &invitee, &now())
            })
            .await;
        log_outcome("invite_musician", invitee_id, session_id, &outcome);
        outcome
    }

    /// Withdraws an invitation. Only the host may revoke.
    pub async fn revoke_invitation(
        &self,
        host_id: &str,
        session_id: &str,
        invitee_id: &str,
    ) -> Result<MutationOutcome> {
        validate_ids(&[("musician", host_id), ("session", session_id), ("musician", invitee_id)])?;
        let outcome = self
            .run("revoke_invitation", move || async move {
                let session = self.load_session(session_id).await?;
                let invitee = self.store.read(&StorePath::user(invitee_id)).await?;
                planner::plan_revoke_invitation(host_id, &session, invitee_id, invitee.revision)
            })
            .await;
        log_outcome("revoke_invitation", invitee_id, session_id, &outcome);
        outcome
    }

    /// Leaves a session as a member.
    pub async fn leave_session(&self, user_id: &str, session_id: &str) -> Result<MutationOutcome> {
        validate_ids(&[("musician", user_id), ("session", session_id)])?;
        let outcome = self
            .run("leave_session", move || async move {
                let session = self.load_session(session_id).await?;
                planner::plan_leave_session(user_id, &session)
            })
            .await;
        log_outcome("leave_session", user_id, session_id, &outcome);
        outcome
    }

    /// Ends a session. Only the host may end it.
    pub async fn end_session(&self, host_id: &str, session_id: &str) -> Result<MutationOutcome> {
        validate_ids(&[("musician", host_id), ("session", session_id)])?;
        let outcome = self
            .run("end_session", move || async move {
                let session = self.load_session(session_id).await?;
                planner::plan_end_session(host_id, &session)
            })
            .await;
        log_outcome("end_session", host_id, session_id, &outcome);
        outcome
    }

    /// Deletes an account and removes it from every session it appears in.
    pub async fn delete_account(&self, user_id: &str) -> Result<DeletionReport> {
        let report = self
            .run("delete_account", move || async move {
                let user = self.load_musician(user_id).await?;
                let sessions = self
                    .store
                    .list_records::<Session>(&StorePath::sessions())
                    .await?;
                Ok(planner::plan_delete_account(&user, &sessions))
            })
            .await?;

        tracing::info!(
            user_id,
            sessions_deleted = report.sessions_deleted.len(),
            memberships_removed = report.memberships_removed.len(),
            invitations_removed = report.invitations_removed.len(),
            "Deleted account"
        );
        Ok(report)
    }

    /// Applies a profile edit.
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<MutationOutcome> {
        let outcome = self
            .run("update_profile", move || async move {
                let user = self.load_musician(user_id).await?;
                planner::plan_update_profile(&user, update)
            })
            .await?;
        tracing::info!(user_id, ?outcome, "Profile update");
        Ok(outcome)
    }

    // ============================================================================
    // Transaction execution
    // ============================================================================

    /// Plans and commits, re-planning after each conflict until the retry
    /// budget is spent.
    async fn run<T, F, Fut>(&self, operation: &'static str, plan: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Planned<T>>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let planned = plan().await?;
            if planned.transaction.is_empty() {
                return Ok(planned.outcome);
            }

            match self.commit(operation, planned.transaction).await {
                Ok(()) => return Ok(planned.outcome),
                Err(err) if err.is_conflict() && attempt < self.settings.conflict_retries => {
                    attempt += 1;
                    tracing::warn!(operation, attempt, error = %err, "Transaction conflict, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn commit(&self, operation: &'static str, transaction: Transaction) -> Result<()> {
        let ops = transaction.ops.len();
        match tokio::time::timeout(
            self.settings.write_timeout(),
            self.store.transactional_write(transaction),
        )
        .await
        {
            Ok(result) => {
                if result.is_ok() {
                    tracing::debug!(operation, ops, "Transaction committed");
                }
                result
            }
            Err(_) => {
                tracing::error!(operation, timeout_ms = self.settings.write_timeout_ms, "Transaction timed out");
                Err(JamError::timeout(operation, self.settings.write_timeout_ms))
            }
        }
    }
}

fn log_outcome(operation: &str, user_id: &str, session_id: &str, outcome: &Result<MutationOutcome>) {
    match outcome {
        Ok(outcome) => tracing::info!(operation, user_id, session_id, ?outcome, "Membership operation"),
        Err(err) => tracing::debug!(operation, user_id, session_id, error = %err, "Membership operation failed"),
    }
}
