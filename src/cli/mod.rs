//! Command-line interface definitions.

pub mod check;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storewatch - Announces new and changed storefront listings to chat subscribers.
#[derive(Parser, Debug)]
#[command(name = "storewatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the catalog and broadcast changes (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `storewatch check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the watched seller
    #[arg(long)]
    pub seller_id: Option<String>,

    /// Override the chat registry file
    #[arg(long)]
    pub chats_file: Option<PathBuf>,

    /// Override the cache file
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Telegram bot token (defaults to TELEGRAM_BOT_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Announce the whole catalog on the first run instead of recording it silently
    #[arg(long)]
    pub no_prime: bool,
}
