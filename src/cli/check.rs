//! Configuration validation command.

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::Config;

/// Validate configuration file without starting the bot.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Seller: {}", config.seller_id);
    println!("  Catalog: {}", config.catalog_url()?);
    println!("  Poll interval: {}s", config.poll.interval_secs);
    println!("  Cache file: {}", config.cache.path.display());
    println!("  Chats file: {}", config.chats.path.display());
    println!("  Broadcast concurrency: {}", config.broadcast.concurrency);
    println!();

    if config.telegram.enabled {
        if config.telegram.active_token().is_some() {
            println!("✓ Telegram configured and enabled");
        } else {
            println!("⚠ Telegram enabled but missing environment variable:");
            println!("    - TELEGRAM_BOT_TOKEN");
        }
    } else {
        println!("  Telegram: disabled");
    }

    println!();
    println!("Configuration is ready to use.");
    Ok(())
}
