use super::print_json;
use anyhow::Result;
use clap::Args;
use jamhub_application::MembershipUseCase;
use jamhub_core::membership::MutationOutcome;
use jamhub_core::musician::ProfileUpdate;

/// Profile fields to change. With none given the profile is printed.
#[derive(Args, Debug, Default)]
pub struct ProfileEdit {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub instruments: Option<String>,
    #[arg(long)]
    pub genres: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
}

impl From<ProfileEdit> for ProfileUpdate {
    fn from(edit: ProfileEdit) -> Self {
        ProfileUpdate {
            name: edit.name,
            instruments: edit.instruments,
            genres: edit.genres,
            city: edit.city,
            country: edit.country,
            profile_image_url: edit.image_url,
        }
    }
}

pub async fn run(usecase: &MembershipUseCase, user: &str, edit: ProfileEdit) -> Result<()> {
    let update = ProfileUpdate::from(edit);
    if !update.is_empty() {
        let outcome = usecase.update_profile(user, &update).await?;
        if outcome == MutationOutcome::Unchanged {
            println!("profile {}: nothing to change", user);
        }
    }
    print_json(&usecase.musician(user).await?)
}

pub async fn invitations(usecase: &MembershipUseCase, user: &str) -> Result<()> {
    let invitations = usecase.invitations(user).await?;
    if invitations.is_empty() {
        println!("no pending invitations for {}", user);
        return Ok(());
    }
    for invitation in invitations {
        println!(
            "{}\t{}\thost {}\tinvited {}",
            invitation.session_id, invitation.session_name, invitation.host_id, invitation.invited_at
        );
    }
    Ok(())
}
