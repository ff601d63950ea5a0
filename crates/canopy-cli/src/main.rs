//! canopy: command-line client for the Canopy tree-tracking dashboard
//!
//! Reads `canopy.toml` (or `--config`), keeps the bearer token in a file
//! managed by `canopy login` / `canopy logout`, and drives the dashboard
//! store for every other command.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use canopy_sdk::{CanopyConfig, CredentialStore, FileCredentialStore, Gateway, Repositories};
use clap::Parser;
use tracing::debug;

use commands::Command;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Track trees, care records and reminders from the terminal")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "canopy.toml", env = "CANOPY_CONFIG")]
    config: PathBuf,

    /// API base URL (overrides config file)
    #[arg(long, env = "CANOPY_API_URL")]
    base_url: Option<String>,

    /// Token file (overrides config file)
    #[arg(long, env = "CANOPY_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("canopy=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CanopyConfig::load(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(token_path) = cli.token_path {
        config.credentials.token_path = token_path;
    }
    debug!("API: {}", config.api.base_url);
    debug!("Token file: {}", config.credentials.token_path.display());

    let credentials = Arc::new(FileCredentialStore::new(config.credentials.token_path.clone()));

    let result = match cli.command {
        Command::Login { token } => commands::login(credentials.as_ref(), &token),
        Command::Logout => commands::logout(credentials.as_ref()),
        command => {
            if !credentials.has_token() {
                eprintln!("Error: not signed in, run `canopy login --token <TOKEN>` first");
                std::process::exit(1);
            }
            let gateway = Gateway::new(config.api.clone(), credentials.clone())?;
            let repos = Repositories::http(Arc::new(gateway));
            commands::execute(repos, config.dashboard, command, cli.json).await
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
