//! # wikimcp-cli
//!
//! Command-line entry point: runs the MCP server on stdio and offers a few
//! inspection commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wikimcp_client::WikiRegistry;
use wikimcp_core::error::format_error_with_suggestion;
use wikimcp_core::Config;

mod commands;

/// Application context containing shared state.
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub wikis: Arc<WikiRegistry>,
}

/// wikimcp - MediaWiki tools over the Model Context Protocol
#[derive(Parser)]
#[command(name = "wikimcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (JSON or TOML)
    #[arg(short, long, env = "CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Wiki to select at startup, overriding defaultWiki
    #[arg(short, long, value_name = "WIKI")]
    wiki: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP on stdin/stdout (the default)
    Serve,
    /// List configured wikis
    Wikis,
    /// Check configuration and wiki connectivity
    Doctor,
    /// Show version information
    Version,
}

/// Load, override and validate the configuration.
fn load_config(path: &std::path::Path, wiki: Option<&str>) -> wikimcp_core::Result<Config> {
    let mut config = Config::load_validated(path)?;
    if let Some(wiki) = wiki {
        if !config.wikis.contains_key(wiki) {
            return Err(wikimcp_core::Error::Config(format!(
                "Wiki \"{}\" not found in config",
                wiki
            )));
        }
        config.default_wiki = wiki.to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol; logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match load_config(&config_path, cli.wiki.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error_with_suggestion(&e));
            std::process::exit(1);
        }
    };

    let wikis = Arc::new(WikiRegistry::from_config(&config)?);
    let ctx = AppContext {
        config,
        config_path,
        wikis,
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::run(&ctx).await?,
        Commands::Wikis => commands::wikis::run(&ctx).await,
        Commands::Doctor => commands::doctor::run(&ctx).await?,
        Commands::Version => println!("wikimcp {}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}
