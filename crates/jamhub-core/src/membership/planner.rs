//! Transaction planners for the membership lifecycle.
//!
//! Each planner is a pure function from record snapshots to the complete set
//! of writes one operation needs, pinned at the revisions it was planned
//! against. The invitee record under the session and the invitation mirror
//! under the musician are only ever written by the same planner call, so a
//! committed transaction can never leave one without the other.

use super::outcome::{DeletionReport, MutationOutcome};
use super::state::MembershipState;
use crate::error::{JamError, Result};
use crate::musician::{Invitation, Musician, ProfileUpdate};
use crate::session::{RosterEntry, Session};
use crate::store::{StorePath, Transaction, Versioned};
use serde::Serialize;
use serde_json::{Value, json};

/// A transaction together with the outcome it produces once committed.
///
/// An empty transaction means there is nothing to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<T> {
    pub transaction: Transaction,
    pub outcome: T,
}

impl<T> Planned<T> {
    fn commit(transaction: Transaction, outcome: T) -> Self {
        Self {
            transaction,
            outcome,
        }
    }

    fn nothing(outcome: T) -> Self {
        Self {
            transaction: Transaction::new(),
            outcome,
        }
    }
}

fn to_value<T: Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

fn pin_pair(tx: &mut Transaction, user: &Versioned<Musician>, session: &Versioned<Session>) {
    tx.expect(StorePath::session(&session.record.id), session.revision)
        .expect(StorePath::user(&user.record.id), user.revision);
}

/// Member record, session count and last session: the writes shared by
/// every path into membership.
fn add_member(
    tx: &mut Transaction,
    user: &Musician,
    session: &Session,
    now: &str,
) -> Result<()> {
    tx.put(
        StorePath::session_member(&session.id, &user.id),
        to_value(&RosterEntry::new(&user.id, now))?,
    )
    .put(
        StorePath::user(&user.id).child("session_count"),
        json!(user.session_count.saturating_add(1)),
    )
    .put(
        StorePath::user(&user.id).child("last_session"),
        json!(session.name),
    );
    Ok(())
}

/// Removes an invitee record and its mirror as one unit.
fn remove_invitation(tx: &mut Transaction, session_id: &str, user_id: &str) {
    tx.delete(StorePath::session_invitee(session_id, user_id))
        .delete(StorePath::user_invitation(user_id, session_id));
}

/// Joins `user` to `session` with a join code.
///
/// Hosts and members get `AlreadyMember`. A wrong code fails with
/// `InvalidCode` and plans no writes. An invitee who joins by code has the
/// pending invitation consumed in the same transaction.
pub fn plan_join_by_code(
    user: &Versioned<Musician>,
    session: &Versioned<Session>,
    code: &str,
    now: &str,
) -> Result<Planned<MutationOutcome>> {
    let state = MembershipState::of(&user.record.id, &session.record);
    if state.is_participant() {
        return Ok(Planned::nothing(MutationOutcome::AlreadyMember));
    }

    if code != session.record.join_code {
        return Err(JamError::invalid_code(&session.record.id));
    }

    let mut tx = Transaction::new();
    pin_pair(&mut tx, user, session);
    add_member(&mut tx, &user.record, &session.record, now)?;
    if state == MembershipState::Invited || user.record.is_invited_to(&session.record.id) {
        remove_invitation(&mut tx, &session.record.id, &user.record.id);
    }

    Ok(Planned::commit(tx, MutationOutcome::Applied))
}

/// Accepts a pending invitation.
///
/// Adds the member record, bumps the session count, records the last session
/// and removes both the invitee record and its mirror. Repeating the call
/// after it committed yields `AlreadyMember`. A mirror left behind without a
/// matching invitee record is removed and reported as `InvitationWithdrawn`.
pub fn plan_accept_invitation(
    user: &Versioned<Musician>,
    session: &Versioned<Session>,
    now: &str,
) -> Result<Planned<MutationOutcome>> {
    match MembershipState::of(&user.record.id, &session.record) {
        MembershipState::Host | MembershipState::Member => {
            Ok(Planned::nothing(MutationOutcome::AlreadyMember))
        }
        MembershipState::Stranger if user.record.is_invited_to(&session.record.id) => {
            let mut tx = Transaction::new();
            pin_pair(&mut tx, user, session);
            tx.delete(StorePath::user_invitation(&user.record.id, &session.record.id));
            Ok(Planned::commit(tx, MutationOutcome::InvitationWithdrawn))
        }
        MembershipState::Stranger => Err(JamError::not_found(
            "invitation",
            format!("{}/{}", session.record.id, user.record.id),
        )),
        MembershipState::Invited => {
            let mut tx = Transaction::new();
            pin_pair(&mut tx, user, session);
            add_member(&mut tx, &user.record, &session.record, now)?;
            remove_invitation(&mut tx, &session.record.id, &user.record.id);
            Ok(Planned::commit(tx, MutationOutcome::Applied))
        }
    }
}

fn ensure_host(host_id: &str, session: &Session) -> Result<()> {
    if session.is_host(host_id) {
        Ok(())
    } else {
        Err(JamError::NotHost {
            user_id: host_id.to_string(),
            session_id: session.id.clone(),
        })
    }
}

/// Invites `invitee` to `session` on behalf of `host_id`.
///
/// Writes the invitee record and the mirror together.
pub fn plan_invite(
    host_id: &str,
    session: &Versioned<Session>,
    invitee: &Versioned<Musician>,
    now: &str,
) -> Result<Planned<MutationOutcome>> {
    ensure_host(host_id, &session.record)?;

    let (session_rec, user) = (&session.record, &invitee.record);
    match MembershipState::of(&user.id, session_rec) {
        MembershipState::Host | MembershipState::Member => {
            Ok(Planned::nothing(MutationOutcome::AlreadyMember))
        }
        MembershipState::Invited if user.is_invited_to(&session_rec.id) => {
            Ok(Planned::nothing(MutationOutcome::AlreadyInvited))
        }
        // A stranger, or an invitee whose mirror went missing
        _ => {
            let invitation = Invitation {
                session_id: session_rec.id.clone(),
                session_name: session_rec.name.clone(),
                host_id: host_id.to_string(),
                invited_at: now.to_string(),
            };

            let mut tx = Transaction::new();
            pin_pair(&mut tx, invitee, session);
            tx.put(
                StorePath::session_invitee(&session_rec.id, &user.id),
                to_value(&RosterEntry::new(&user.id, now))?,
            )
            .put(
                StorePath::user_invitation(&user.id, &session_rec.id),
                to_value(&invitation)?,
            );
            Ok(Planned::commit(tx, MutationOutcome::Applied))
        }
    }
}

/// Withdraws a pending invitation on behalf of the host.
///
/// `invitee_revision` pins the invitee's profile path; the mirror under it
/// is deleted even if the profile itself is gone.
pub fn plan_revoke_invitation(
    host_id: &str,
    session: &Versioned<Session>,
    invitee_id: &str,
    invitee_revision: u64,
) -> Result<Planned<MutationOutcome>> {
    ensure_host(host_id, &session.record)?;
    if !session.record.is_invitee(invitee_id) {
        return Err(JamError::not_found(
            "invitation",
            format!("{}/{}", session.record.id, invitee_id),
        ));
    }

    let mut tx = Transaction::new();
    tx.expect(StorePath::session(&session.record.id), session.revision)
        .expect(StorePath::user(invitee_id), invitee_revision);
    remove_invitation(&mut tx, &session.record.id, invitee_id);
    Ok(Planned::commit(tx, MutationOutcome::Applied))
}

/// Declines a pending invitation on behalf of the invitee.
pub fn plan_decline_invitation(
    user: &Versioned<Musician>,
    session: &Versioned<Session>,
) -> Result<Planned<MutationOutcome>> {
    let session_id = &session.record.id;
    let user_id = &user.record.id;
    if !session.record.is_invitee(user_id) && !user.record.is_invited_to(session_id) {
        return Err(JamError::not_found(
            "invitation",
            format!("{}/{}", session_id, user_id),
        ));
    }

    let mut tx = Transaction::new();
    pin_pair(&mut tx, user, session);
    remove_invitation(&mut tx, session_id, user_id);
    Ok(Planned::commit(tx, MutationOutcome::Applied))
}

/// Removes a member from a session. The host ends the session instead.
pub fn plan_leave_session(
    user_id: &str,
    session: &Versioned<Session>,
) -> Result<Planned<MutationOutcome>> {
    let session_rec = &session.record;
    if session_rec.is_host(user_id) {
        return Err(JamError::HostCannotLeave {
            user_id: user_id.to_string(),
            session_id: session_rec.id.clone(),
        });
    }
    if !session_rec.is_member(user_id) {
        return Err(JamError::not_found(
            "membership",
            format!("{}/{}", session_rec.id, user_id),
        ));
    }

    let mut tx = Transaction::new();
    tx.expect(StorePath::session(&session_rec.id), session.revision)
        .delete(StorePath::session_member(&session_rec.id, user_id));
    Ok(Planned::commit(tx, MutationOutcome::Applied))
}

fn delete_session(tx: &mut Transaction, session: &Session, skip_mirror_of: Option<&str>) {
    tx.delete(StorePath::session(&session.id));
    for invitee_id in session.invitees.keys() {
        if Some(invitee_id.as_str()) != skip_mirror_of {
            tx.delete(StorePath::user_invitation(invitee_id, &session.id));
        }
    }
}

/// Ends a session: deletes it along with every invitee's mirror.
pub fn plan_end_session(
    host_id: &str,
    session: &Versioned<Session>,
) -> Result<Planned<MutationOutcome>> {
    ensure_host(host_id, &session.record)?;

    let mut tx = Transaction::new();
    tx.expect(StorePath::session(&session.record.id), session.revision);
    delete_session(&mut tx, &session.record, None);
    Ok(Planned::commit(tx, MutationOutcome::Applied))
}

/// Deletes an account and sweeps it out of every session.
///
/// Every session is visited: hosted sessions are deleted outright, and the
/// user's member or invitee record is removed from all others. Sessions the
/// user has no record in are neither touched nor pinned.
pub fn plan_delete_account(
    user: &Versioned<Musician>,
    sessions: &[Versioned<Session>],
) -> Planned<DeletionReport> {
    let user_id = user.record.id.as_str();
    let mut report = DeletionReport::new(user_id);
    let mut tx = Transaction::new();
    tx.expect(StorePath::user(user_id), user.revision);

    for versioned in sessions {
        let session = &versioned.record;
        let state = MembershipState::of(user_id, session);
        if state == MembershipState::Stranger {
            continue;
        }

        tx.expect(StorePath::session(&session.id), versioned.revision);
        if state == MembershipState::Host {
            // The user's own mirror disappears with the profile below
            delete_session(&mut tx, session, Some(user_id));
            report.sessions_deleted.push(session.id.clone());
            continue;
        }

        if session.is_member(user_id) {
            tx.delete(StorePath::session_member(&session.id, user_id));
            report.memberships_removed.push(session.id.clone());
        }
        if session.is_invitee(user_id) {
            tx.delete(StorePath::session_invitee(&session.id, user_id));
            report.invitations_removed.push(session.id.clone());
        }
    }

    tx.delete(StorePath::user(user_id));
    Planned::commit(tx, report)
}

/// Applies a profile edit as field-level writes.
pub fn plan_update_profile(
    user: &Versioned<Musician>,
    update: &ProfileUpdate,
) -> Result<Planned<MutationOutcome>> {
    let mut edited = user.record.clone();
    if !update.apply_to(&mut edited) {
        return Ok(Planned::nothing(MutationOutcome::Unchanged));
    }

    let base = StorePath::user(&user.record.id);
    let mut tx = Transaction::new();
    tx.expect(base.clone(), user.revision);

    let current = to_value(&user.record)?;
    let next = to_value(&edited)?;
    if let (Value::Object(current), Value::Object(next)) = (current, next) {
        for (field, value) in next {
            if current.get(&field) != Some(&value) {
                tx.put(base.child(&field), value);
            }
        }
    }

    Ok(Planned::commit(tx, MutationOutcome::Applied))
}
