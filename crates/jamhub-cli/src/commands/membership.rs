use super::print_json;
use anyhow::Result;
use jamhub_application::{MembershipUpdate, MembershipUseCase};
use jamhub_core::membership::MutationOutcome;

fn report(action: &str, user: &str, session: &str, outcome: MutationOutcome) {
    let message = match outcome {
        MutationOutcome::Applied => "done",
        MutationOutcome::AlreadyMember => "already a member",
        MutationOutcome::AlreadyInvited => "already invited",
        MutationOutcome::Unchanged => "nothing to change",
        MutationOutcome::InvitationWithdrawn => "invitation no longer open, removed",
    };
    println!("{} {} / {}: {}", action, user, session, message);
}

pub async fn status(usecase: &MembershipUseCase, user: &str, session: &str) -> Result<()> {
    let view = usecase.membership_view(user, session).await?;
    print_json(&view)
}

pub async fn watch(usecase: &MembershipUseCase, user: &str, session: &str) -> Result<()> {
    let mut watch = usecase.watch_membership(user, session)?;
    loop {
        let update = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = watch.next() => update,
        };
        match update {
            Some(MembershipUpdate::View(view)) => print_json(&view)?,
            Some(MembershipUpdate::SessionEnded) => {
                println!("session {} ended", session);
                break;
            }
            None => break,
        }
    }
    watch.cancel().await;
    Ok(())
}

pub async fn join(usecase: &MembershipUseCase, user: &str, session: &str, code: &str) -> Result<()> {
    let outcome = usecase.join_by_code(user, session, code).await?;
    report("join", user, session, outcome);
    Ok(())
}

pub async fn accept(usecase: &MembershipUseCase, user: &str, session: &str) -> Result<()> {
    let outcome = usecase.accept_invitation(user, session).await?;
    report("accept", user, session, outcome);
    Ok(())
}

pub async fn decline(usecase: &MembershipUseCase, user: &str, session: &str) -> Result<()> {
    let outcome = usecase.decline_invitation(user, session).await?;
    report("decline", user, session, outcome);
    Ok(())
}

pub async fn invite(
    usecase: &MembershipUseCase,
    host: &str,
    session: &str,
    musician: &str,
) -> Result<()> {
    let outcome = usecase.invite_musician(host, session, musician).await?;
    report("invite", musician, session, outcome);
    Ok(())
}

pub async fn revoke(
    usecase: &MembershipUseCase,
    host: &str,
    session: &str,
    musician: &str,
) -> Result<()> {
    let outcome = usecase.revoke_invitation(host, session, musician).await?;
    report("revoke", musician, session, outcome);
    Ok(())
}

pub async fn leave(usecase: &MembershipUseCase, user: &str, session: &str) -> Result<()> {
    let outcome = usecase.leave_session(user, session).await?;
    report("leave", user, session, outcome);
    Ok(())
}

pub async fn end(usecase: &MembershipUseCase, host: &str, session: &str) -> Result<()> {
    let outcome = usecase.end_session(host, session).await?;
    report("end", host, session, outcome);
    Ok(())
}

pub async fn delete_account(usecase: &MembershipUseCase, user: &str) -> Result<()> {
    let report = usecase.delete_account(user).await?;
    print_json(&report)
}
