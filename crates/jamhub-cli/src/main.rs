use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jamhub_application::MembershipUseCase;
use jamhub_core::config::{JamConfig, StoreBackend};
use jamhub_core::store::Store;
use jamhub_infrastructure::{ConfigService, MemoryStore, TomlFileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "jamhub")]
#[command(about = "JamHub CLI - jam session membership and invitations", long_about = None)]
struct Cli {
    /// Store file (overrides `[store].data_file`)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Config file (defaults to ~/.config/jamhub/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a user's relationship to a session
    Status { user: String, session: String },
    /// Follow a user's relationship to a session until interrupted
    Watch { user: String, session: String },
    /// Join a session with its join code
    Join {
        user: String,
        session: String,
        code: String,
    },
    /// Accept a pending invitation
    Accept { user: String, session: String },
    /// Decline a pending invitation
    Decline { user: String, session: String },
    /// Invite a musician (host only)
    Invite {
        host: String,
        session: String,
        musician: String,
    },
    /// Withdraw an invitation (host only)
    Revoke {
        host: String,
        session: String,
        musician: String,
    },
    /// Leave a session as a member
    Leave { user: String, session: String },
    /// End a session (host only)
    End { host: String, session: String },
    /// Delete an account and remove it from every session
    DeleteAccount { user: String },
    /// List a user's pending invitations
    Invitations { user: String },
    /// Show or edit a musician profile
    Profile {
        user: String,
        #[command(flatten)]
        edit: commands::profile::ProfileEdit,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config);

    let store = open_store(&config, cli.data_file)?;
    let usecase = MembershipUseCase::new(store, config.membership.clone());

    match cli.command {
        Commands::Status { user, session } => {
            commands::membership::status(&usecase, &user, &session).await?
        }
        Commands::Watch { user, session } => {
            commands::membership::watch(&usecase, &user, &session).await?
        }
        Commands::Join {
            user,
            session,
            code,
        } => commands::membership::join(&usecase, &user, &session, &code).await?,
        Commands::Accept { user, session } => {
            commands::membership::accept(&usecase, &user, &session).await?
        }
        Commands::Decline { user, session } => {
            commands::membership::decline(&usecase, &user, &session).await?
        }
        Commands::Invite {
            host,
            session,
            musician,
        } => commands::membership::invite(&usecase, &host, &session, &musician).await?,
        Commands::Revoke {
            host,
            session,
            musician,
        } => commands::membership::revoke(&usecase, &host, &session, &musician).await?,
        Commands::Leave { user, session } => {
            commands::membership::leave(&usecase, &user, &session).await?
        }
        Commands::End { host, session } => {
            commands::membership::end(&usecase, &host, &session).await?
        }
        Commands::DeleteAccount { user } => {
            commands::membership::delete_account(&usecase, &user).await?
        }
        Commands::Invitations { user } => commands::profile::invitations(&usecase, &user).await?,
        Commands::Profile { user, edit } => commands::profile::run(&usecase, &user, edit).await?,
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<JamConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::default_location()?,
    };
    service
        .load()
        .with_context(|| format!("Failed to load config from {}", service.path().display()))
}

fn init_tracing(config: &JamConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &JamConfig, data_file: Option<PathBuf>) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; changes are discarded on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::File => {
            let path = match data_file {
                Some(path) => path,
                None => ConfigService::resolve_store_file(config)?,
            };
            tracing::debug!(path = %path.display(), "Opening store file");
            Ok(Arc::new(TomlFileStore::with_poll_interval(
                path,
                config.store.poll_interval(),
            )))
        }
    }
}
