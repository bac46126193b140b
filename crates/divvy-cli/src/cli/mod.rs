//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use divvy_core::config::Config;
use divvy_core::routing;

mod commands;

#[derive(Parser)]
#[command(name = "divvy")]
#[command(version)]
#[command(about = "Terminal expense-splitting client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Activation URI delivered by the OS
    /// (divvy://app/signUpComplete?code=...)
    #[arg(long, value_name = "URI")]
    deep_link: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List transactions without the TUI
    Transactions {
        /// Group to filter by (defaults to the configured group)
        #[arg(long, value_name = "ID")]
        group: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = crate::logging::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    // default to the interactive app
    let Some(command) = cli.command else {
        let code = match cli.deep_link.as_deref() {
            Some(uri) => Some(
                routing::parse_deep_link(uri)
                    .with_context(|| format!("unrecognized deep link: {uri}"))?,
            ),
            None => None,
        };
        return commands::app::run(&config, code).await;
    };

    match command {
        Commands::Transactions { group } => {
            commands::transactions::run(&config, group.as_deref()).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Show => commands::config::show(&config),
        },
    }
}
