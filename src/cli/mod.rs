use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::remote::RemoteNotesClient;

pub mod commands;

use self::commands::{DeleteArgs, ListArgs, NewArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notewire",
    version,
    about = "Keyboard-first terminal client for a remote notes service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTEWIRE_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the remote endpoint base URL for this invocation
    #[arg(long)]
    pub base_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// List notes, optionally narrowed by a search query and a tag
    List(ListArgs),
    /// Create a new note from the command line
    New(NewArgs),
    /// Print a single note in full
    Show(ShowArgs),
    /// Delete a note by id
    Delete(DeleteArgs),
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTEWIRE_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let mut config = loader.load_or_init()?;
    if let Some(base) = &cli.base_url {
        config.remote.base_url = base.clone();
    }

    let config = Arc::new(config);
    let remote = RemoteNotesClient::new(Arc::new(config.remote.clone()))
        .context("building the HTTP client")?;

    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, remote);
            app.run().await
        }
        Commands::List(args) => commands::list_notes(&remote, args).await,
        Commands::New(args) => commands::new_note(&remote, args).await,
        Commands::Show(args) => commands::show_note(&remote, args).await,
        Commands::Delete(args) => commands::delete_note(&remote, args).await,
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
