use jamhub_application::{MembershipUpdate, MembershipUseCase, MembershipWatch};
use jamhub_core::JamError;
use jamhub_core::config::MembershipSettings;
use jamhub_core::membership::{JoinAction, MembershipState, MutationOutcome, resolve_membership};
use jamhub_core::musician::{Musician, ProfileUpdate};
use jamhub_core::session::{RosterEntry, Session};
use jamhub_core::store::{Store, StorePath};
use jamhub_infrastructure::{MemoryStore, TomlFileStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SEEDED_AT: &str = "2026-10-01T18:00:00+00:00";

fn session(id: &str, host: &str) -> Session {
    Session {
        id: id.to_string(),
        name: format!("Jam {}", id),
        host_id: host.to_string(),
        start_time: "20:00".to_string(),
        location: "Rehearsal Room".to_string(),
        genre: "Rock".to_string(),
        join_code: format!("code-{}", id),
        members: BTreeMap::new(),
        invitees: BTreeMap::new(),
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    usecase: MembershipUseCase,
}

impl Fixture {
    async fn new(users: &[&str]) -> Self {
        let store = Arc::new(MemoryStore::new());
        for user in users {
            store
                .seed(StorePath::user(user), &Musician::new(*user, user.to_uppercase()))
                .await
                .unwrap();
        }
        let usecase = MembershipUseCase::new(store.clone(), MembershipSettings::default());
        Self { store, usecase }
    }

    async fn add_session(&self, session: &Session) {
        self.store
            .seed(StorePath::session(&session.id), session)
            .await
            .unwrap();
    }

    async fn sequence(&self) -> u64 {
        self.store.document().await.sequence
    }

    /// Checks that no session lists anyone as both member and invitee and
    /// that every invitee record has its mirror.
    async fn assert_consistent(&self) {
        for session in self.usecase.sessions().await.unwrap() {
            assert!(
                session.overlapping_ids().is_empty(),
                "{} has overlapping roster {:?}",
                session.id,
                session.overlapping_ids()
            );
            for invitee in session.invitees.keys() {
                let musician = self.usecase.musician(invitee).await.unwrap();
                assert!(musician.is_invited_to(&session.id), "missing mirror for {}", invitee);
            }
        }
    }
}

#[tokio::test]
async fn test_invited_user_accepts_and_becomes_member() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.invite_musician("h", "s", "u1").await.unwrap();

    let s = fx.usecase.session("s").await.unwrap();
    assert_eq!(
        resolve_membership::<String>("u1", &s, &[], &["u1".to_string()]),
        MembershipState::Invited
    );
    let view = fx.usecase.membership_view("u1", "s").await.unwrap();
    assert_eq!(view.affordance.action, JoinAction::AcceptInvitation);

    let outcome = fx.usecase.accept_invitation("u1", "s").await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);

    let s = fx.usecase.session("s").await.unwrap();
    assert_eq!(s.member_ids(), vec!["u1".to_string()]);
    assert!(s.invitee_ids().is_empty());
    let u1 = fx.usecase.musician("u1").await.unwrap();
    assert!(u1.invitations.is_empty());
    assert_eq!(u1.session_count, 1);
    assert_eq!(u1.last_session.as_deref(), Some("Jam s"));

    assert_eq!(
        resolve_membership("u1", &s, &s.member_ids(), &s.invitee_ids()),
        MembershipState::Member
    );
    fx.assert_consistent().await;
}

#[tokio::test]
async fn test_accept_twice_is_already_member_without_side_effects() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.invite_musician("h", "s", "u1").await.unwrap();
    fx.usecase.accept_invitation("u1", "s").await.unwrap();
    let before = fx.sequence().await;

    let second = fx.usecase.accept_invitation("u1", "s").await.unwrap();

    assert_eq!(second, MutationOutcome::AlreadyMember);
    assert_eq!(fx.sequence().await, before);
    assert_eq!(fx.usecase.musician("u1").await.unwrap().session_count, 1);
}

#[tokio::test]
async fn test_wrong_code_changes_nothing() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;
    let before = fx.sequence().await;

    let err = fx.usecase.join_by_code("u1", "s", "nope").await.unwrap_err();

    assert_eq!(err, JamError::invalid_code("s"));
    assert_eq!(fx.sequence().await, before);
    let s = fx.usecase.session("s").await.unwrap();
    assert!(s.members.is_empty());
    assert!(s.invitees.is_empty());
}

#[tokio::test]
async fn test_join_then_resolve_is_member() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;

    let view = fx.usecase.membership_view("u1", "s").await.unwrap();
    assert_eq!(view.state, MembershipState::Stranger);
    assert_eq!(view.affordance.label, "Join Session");

    let outcome = fx.usecase.join_by_code("u1", "s", "code-s").await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);

    let view = fx.usecase.membership_view("u1", "s").await.unwrap();
    assert_eq!(view.state, MembershipState::Member);
    assert_eq!(view.affordance.label, "View Media");

    let again = fx.usecase.join_by_code("u1", "s", "code-s").await.unwrap();
    assert_eq!(again, MutationOutcome::AlreadyMember);
}

#[tokio::test]
async fn test_host_always_resolves_as_host() {
    let fx = Fixture::new(&["h"]).await;
    let mut s = session("s", "h");
    s.members.insert("h".to_string(), RosterEntry::new("h", SEEDED_AT));
    fx.add_session(&s).await;

    let view = fx.usecase.membership_view("h", "s").await.unwrap();
    assert_eq!(view.state, MembershipState::Host);
    assert!(view.affordance.can_invite);
    assert_eq!(
        fx.usecase.join_by_code("h", "s", "whatever").await.unwrap(),
        MutationOutcome::AlreadyMember
    );
}

#[tokio::test]
async fn test_delete_account_sweeps_all_sessions() {
    let fx = Fixture::new(&["h", "u1", "u2"]).await;
    fx.add_session(&session("s1", "h")).await;
    fx.add_session(&session("s2", "h")).await;
    fx.add_session(&session("s3", "u1")).await;
    fx.add_session(&session("s4", "u2")).await;
    fx.usecase.invite_musician("h", "s1", "u2").await.unwrap();
    fx.usecase.join_by_code("h", "s3", "code-s3").await.unwrap();
    fx.usecase.invite_musician("u2", "s4", "h").await.unwrap();

    let report = fx.usecase.delete_account("h").await.unwrap();

    assert_eq!(report.sessions_deleted, vec!["s1", "s2"]);
    assert_eq!(report.memberships_removed, vec!["s3"]);
    assert_eq!(report.invitations_removed, vec!["s4"]);

    let remaining: Vec<String> = fx
        .usecase
        .sessions()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(remaining, vec!["s3", "s4"]);
    assert!(!fx.usecase.session("s3").await.unwrap().is_member("h"));
    assert!(!fx.usecase.session("s4").await.unwrap().is_invitee("h"));
    assert!(fx.usecase.musician("h").await.unwrap_err().is_not_found());
    // u2's invitation to the deleted s1 went with it
    assert!(fx.usecase.invitations("u2").await.unwrap().is_empty());
    fx.assert_consistent().await;
}

#[tokio::test]
async fn test_missing_records_abort_without_writes() {
    let fx = Fixture::new(&["u1"]).await;
    let before = fx.sequence().await;

    let err = fx.usecase.join_by_code("u1", "ghost", "x").await.unwrap_err();
    assert_eq!(err, JamError::not_found("session", "ghost"));

    fx.add_session(&session("s", "h")).await;
    let before_accept = fx.sequence().await;
    let err = fx.usecase.accept_invitation("nobody", "s").await.unwrap_err();
    assert_eq!(err, JamError::not_found("musician", "nobody"));
    assert_eq!(fx.sequence().await, before_accept);

    let err = fx.usecase.delete_account("nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fx.sequence().await, before + 1);
}

#[tokio::test]
async fn test_revoke_and_decline_remove_both_copies() {
    let fx = Fixture::new(&["h", "u1", "u2"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.invite_musician("h", "s", "u1").await.unwrap();
    fx.usecase.invite_musician("h", "s", "u2").await.unwrap();
    assert_eq!(
        fx.usecase.invite_musician("h", "s", "u1").await.unwrap(),
        MutationOutcome::AlreadyInvited
    );

    let err = fx.usecase.revoke_invitation("u2", "s", "u1").await.unwrap_err();
    assert!(matches!(err, JamError::NotHost { .. }));

    fx.usecase.revoke_invitation("h", "s", "u1").await.unwrap();
    fx.usecase.decline_invitation("u2", "s").await.unwrap();

    let s = fx.usecase.session("s").await.unwrap();
    assert!(s.invitees.is_empty());
    assert!(fx.usecase.invitations("u1").await.unwrap().is_empty());
    assert!(fx.usecase.invitations("u2").await.unwrap().is_empty());

    let err = fx.usecase.revoke_invitation("h", "s", "u1").await.unwrap_err();
    assert!(err.is_not_found());
    fx.assert_consistent().await;
}

#[tokio::test]
async fn test_join_by_code_consumes_pending_invitation() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.invite_musician("h", "s", "u1").await.unwrap();

    fx.usecase.join_by_code("u1", "s", "code-s").await.unwrap();

    let s = fx.usecase.session("s").await.unwrap();
    assert!(s.is_member("u1"));
    assert!(!s.is_invitee("u1"));
    assert!(fx.usecase.invitations("u1").await.unwrap().is_empty());
    fx.assert_consistent().await;
}

#[tokio::test]
async fn test_leave_and_end_session() {
    let fx = Fixture::new(&["h", "u1", "u2"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.join_by_code("u1", "s", "code-s").await.unwrap();
    fx.usecase.invite_musician("h", "s", "u2").await.unwrap();

    let err = fx.usecase.leave_session("h", "s").await.unwrap_err();
    assert!(matches!(err, JamError::HostCannotLeave { .. }));

    fx.usecase.leave_session("u1", "s").await.unwrap();
    assert!(!fx.usecase.session("s").await.unwrap().is_member("u1"));

    let err = fx.usecase.end_session("u1", "s").await.unwrap_err();
    assert!(matches!(err, JamError::NotHost { .. }));

    fx.usecase.end_session("h", "s").await.unwrap();
    assert!(fx.usecase.session("s").await.unwrap_err().is_not_found());
    assert!(fx.usecase.invitations("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_profile() {
    let fx = Fixture::new(&["u1"]).await;
    let update = ProfileUpdate {
        instruments: Some("Drums".to_string()),
        city: Some("Austin".to_string()),
        ..Default::default()
    };

    assert_eq!(
        fx.usecase.update_profile("u1", &update).await.unwrap(),
        MutationOutcome::Applied
    );
    assert_eq!(
        fx.usecase.update_profile("u1", &update).await.unwrap(),
        MutationOutcome::Unchanged
    );

    let u1 = fx.usecase.musician("u1").await.unwrap();
    assert_eq!(u1.instruments, "Drums");
    assert_eq!(u1.location(), "Austin");
}

async fn next_update(watch: &mut MembershipWatch) -> Option<MembershipUpdate> {
    tokio::time::timeout(Duration::from_secs(5), watch.next())
        .await
        .expect("watch update")
}

#[tokio::test]
async fn test_watch_follows_lifecycle() {
    let fx = Fixture::new(&["h", "u1"]).await;
    fx.add_session(&session("s", "h")).await;
    fx.usecase.invite_musician("h", "s", "u1").await.unwrap();

    let mut watch = fx.usecase.watch_membership("u1", "s").unwrap();

    match next_update(&mut watch).await {
        Some(MembershipUpdate::View(view)) => assert_eq!(view.state, MembershipState::Invited),
        other => panic!("unexpected update {:?}", other),
    }

    fx.usecase.accept_invitation("u1", "s").await.unwrap();
    match next_update(&mut watch).await {
        Some(MembershipUpdate::View(view)) => assert_eq!(view.state, MembershipState::Member),
        other => panic!("unexpected update {:?}", other),
    }

    fx.usecase.end_session("h", "s").await.unwrap();
    assert_eq!(next_update(&mut watch).await, Some(MembershipUpdate::SessionEnded));

    watch.cancel().await;
}

#[tokio::test]
async fn test_file_store_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlFileStore::new(temp_dir.path().join("store.toml")));
    let usecase = MembershipUseCase::new(store.clone(), MembershipSettings::default());

    let mut seed = jamhub_core::store::Transaction::new();
    seed.put(
        StorePath::session("s"),
        serde_json::to_value(session("s", "h")).unwrap(),
    )
    .put(
        StorePath::user("h"),
        serde_json::to_value(Musician::new("h", "Host")).unwrap(),
    )
    .put(
        StorePath::user("u1"),
        serde_json::to_value(Musician::new("u1", "Ada")).unwrap(),
    );
    store.transactional_write(seed).await.unwrap();

    usecase.invite_musician("h", "s", "u1").await.unwrap();
    usecase.accept_invitation("u1", "s").await.unwrap();

    let reopened = MembershipUseCase::new(
        Arc::new(TomlFileStore::new(temp_dir.path().join("store.toml"))),
        MembershipSettings::default(),
    );
    let view = reopened.membership_view("u1", "s").await.unwrap();
    assert_eq!(view.state, MembershipState::Member);
    assert!(reopened.invitations("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_watch_sees_commits_from_another_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.toml");
    let writer = MembershipUseCase::new(
        Arc::new(TomlFileStore::new(&path)),
        MembershipSettings::default(),
    );

    let mut seed = jamhub_core::store::Transaction::new();
    seed.put(
        StorePath::session("s"),
        serde_json::to_value(session("s", "h")).unwrap(),
    )
    .put(
        StorePath::user("u1"),
        serde_json::to_value(Musician::new("u1", "Ada")).unwrap(),
    );
    writer.store().transactional_write(seed).await.unwrap();

    let watcher = MembershipUseCase::new(
        Arc::new(TomlFileStore::with_poll_interval(&path, Duration::from_millis(20))),
        MembershipSettings::default(),
    );
    let mut watch = watcher.watch_membership("u1", "s").unwrap();
    match next_update(&mut watch).await {
        Some(MembershipUpdate::View(view)) => assert_eq!(view.state, MembershipState::Stranger),
        other => panic!("unexpected update {:?}", other),
    }

    writer.join_by_code("u1", "s", "code-s").await.unwrap();

    match next_update(&mut watch).await {
        Some(MembershipUpdate::View(view)) => assert_eq!(view.state, MembershipState::Member),
        other => panic!("unexpected update {:?}", other),
    }
    watch.cancel().await;
}

#[tokio::test]
async fn test_write_log_does_not_grow_across_session_cycles() {
    let fx = Fixture::new(&[]).await;
    let mut logged = Vec::new();

    for _ in 0..4 {
        for user in ["h", "u1"] {
            fx.store
                .seed(StorePath::user(user), &Musician::new(user, user.to_uppercase()))
                .await
                .unwrap();
        }
        fx.add_session(&session("s", "h")).await;
        fx.usecase.join_by_code("u1", "s", "code-s").await.unwrap();
        fx.usecase.end_session("h", "s").await.unwrap();
        fx.usecase.delete_account("u1").await.unwrap();
        fx.usecase.delete_account("h").await.unwrap();

        assert!(fx.usecase.sessions().await.unwrap().is_empty());
        logged.push(fx.store.document().await.logged_paths());
    }

    assert!(logged.windows(2).all(|w| w[0] == w[1]), "{:?}", logged);
}

#[tokio::test]
async fn test_accept_clears_invitation_left_without_session_record() {
    let fx = Fixture::new(&["h"]).await;
    fx.add_session(&session("s", "h")).await;
    let mut u1 = Musician::new("u1", "Ada");
    u1.invitations.insert(
        "s".to_string(),
        jamhub_core::musician::Invitation {
            session_id: "s".to_string(),
            session_name: "Jam s".to_string(),
            host_id: "h".to_string(),
            invited_at: SEEDED_AT.to_string(),
        },
    );
    fx.store.seed(StorePath::user("u1"), &u1).await.unwrap();

    let outcome = fx.usecase.accept_invitation("u1", "s").await.unwrap();

    assert_eq!(outcome, MutationOutcome::InvitationWithdrawn);
    assert!(fx.usecase.invitations("u1").await.unwrap().is_empty());
    assert!(!fx.usecase.session("s").await.unwrap().is_member("u1"));
    assert_eq!(fx.usecase.musician("u1").await.unwrap().session_count, 0);
    assert!(
        fx.usecase
            .accept_invitation("u1", "s")
            .await
            .unwrap_err()
            .is_not_found()
    );
    fx.assert_consistent().await;
}
