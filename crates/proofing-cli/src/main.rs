use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

use context::AppContext;

#[derive(Parser)]
#[command(name = "proofing")]
#[command(about = "Proofing - client photo selection for photography studios", long_about = None)]
struct Cli {
    /// Keep config and data under this directory instead of the platform defaults
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Also print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage selection sessions (operator)
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// List the candidate photos of a folder
    Photos {
        /// Folder reference as understood by the file listing provider
        folder: String,
    },
    /// Open a session by access token and select photos interactively
    Pick {
        /// Client access token
        token: String,
    },
    /// Inspect and deliver queued completion notices
    Outbox {
        #[command(subcommand)]
        action: OutboxAction,
    },
}

/// Package limits shared by `create` and `settings`.
#[derive(clap::Args)]
struct PackageArgs {
    /// Exact number of photos the client must select
    #[arg(long)]
    total: u32,

    /// Extra limit as ID:LABEL:LIMIT (repeatable), e.g. cover:Album cover:1
    #[arg(long = "extra", value_name = "ID:LABEL:LIMIT")]
    extras: Vec<String>,

    /// Last day the client may open the link (YYYY-MM-DD)
    #[arg(long)]
    expires: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Create a session for a project
    Create {
        project: String,
        /// Folder reference of the candidate photos
        #[arg(long)]
        folder: String,
        #[command(flatten)]
        package: PackageArgs,
    },
    /// List all sessions
    List,
    /// Show one session with its selection
    Show { id: String },
    /// Replace the package limits of a session
    Settings {
        id: String,
        #[command(flatten)]
        package: PackageArgs,
    },
    /// Reopen a completed session for editing
    Unlock { id: String },
    /// Issue a new access token; the old link stops working
    RegenerateToken { id: String },
    /// Point a session at another folder
    SetFolder { id: String, folder: String },
    /// Star or unstar a photo
    Star {
        id: String,
        photo: String,
        /// Remove the star instead
        #[arg(long)]
        unset: bool,
    },
    /// Delete a session
    Delete { id: String },
}

#[derive(Subcommand)]
enum OutboxAction {
    /// Send every pending notice once
    Drain,
    /// List all outbox events
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = AppContext::load(cli.data_dir)?;
    logging::init(&ctx.paths, cli.verbose);
    tracing::debug!(config = %ctx.config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Session { action } => match action {
            SessionAction::Create {
                project,
                folder,
                package,
            } => {
                let settings = commands::session::parse_settings(&package)?;
                commands::session::create(&ctx, &project, &folder, settings).await?
            }
            SessionAction::List => commands::session::list(&ctx).await?,
            SessionAction::Show { id } => commands::session::show(&ctx, &id).await?,
            SessionAction::Settings { id, package } => {
                let settings = commands::session::parse_settings(&package)?;
                commands::session::update_settings(&ctx, &id, settings).await?
            }
            SessionAction::Unlock { id } => commands::session::unlock(&ctx, &id).await?,
            SessionAction::RegenerateToken { id } => {
                commands::session::regenerate_token(&ctx, &id).await?
            }
            SessionAction::SetFolder { id, folder } => {
                commands::session::set_folder(&ctx, &id, &folder).await?
            }
            SessionAction::Star { id, photo, unset } => {
                commands::session::star(&ctx, &id, &photo, !unset).await?
            }
            SessionAction::Delete { id } => commands::session::delete(&ctx, &id).await?,
        },
        Commands::Photos { folder } => commands::photos::list(&ctx, &folder).await?,
        Commands::Pick { token } => commands::pick::run(&ctx, &token).await?,
        Commands::Outbox { action } => match action {
            OutboxAction::Drain => commands::outbox::drain(&ctx).await?,
            OutboxAction::List => commands::outbox::list(&ctx).await?,
        },
    }

    Ok(())
}
