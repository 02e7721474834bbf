use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod agent;
mod config;
mod controller;
mod session;
mod ui;

use config::Config;
use controller::{ConversationController, TurnResult};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat for a remote conversational agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration directory (defaults to ~/.parley)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply, without the chat UI
    Send { message: String },
    /// Show where configuration lives and whether credentials are set
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config_dir {
        Some(dir) => Config::load_from(dir)?,
        None => Config::load()?,
    };

    match cli.command {
        None => ui::app::run(config).await,
        Some(Commands::Send { message }) => send_once(config, &message).await,
        Some(Commands::Config) => show_config(&config),
    }
}

/// One-shot submission: same lifecycle as the TUI, one turn, then exit.
async fn send_once(config: Config, message: &str) -> Result<()> {
    let mut controller = ConversationController::new(&config)?;

    match controller.submit(message).await {
        Some(TurnResult::Reply(reply)) => {
            println!("{}", reply);
            Ok(())
        }
        Some(TurnResult::Error(error)) => anyhow::bail!("{}", error),
        None => {
            println!("Nothing to send.");
            Ok(())
        }
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("Config file: {}", config.config_path().display());
    println!(
        "Agent endpoint: {}",
        if config.api_url.is_some() { "configured" } else { "not configured" }
    );
    // Report presence only; the credential itself is never printed.
    println!(
        "Access key: {}",
        if config.api_key.is_some() { "configured" } else { "not configured" }
    );

    if !config.has_credentials() {
        println!();
        println!("Set api_url and api_key in config.toml,");
        println!("or export PARLEY_API_URL and PARLEY_API_KEY.");
    }

    Ok(())
}
