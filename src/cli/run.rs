//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::bootstrap::run_with_shutdown;
use crate::infrastructure::config::{Config, ConfigOverrides};

impl RunArgs {
    /// Command-line values that replace config file values.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            seller_id: self.seller_id.clone(),
            chats_path: self.chats_file.clone(),
            cache_path: self.cache_file.clone(),
            bot_token: self.token.clone(),
            debug: self.debug,
            json_logs: self.json_logs,
            no_prime: self.no_prime,
        }
    }
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = Config::load_with_overrides(&args.config, &args.overrides())?;

    config.init_logging();

    info!(
        seller_id = %config.seller_id,
        interval_secs = config.poll.interval_secs,
        cache = %config.cache.path.display(),
        chats = %config.chats.path.display(),
        "storewatch starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown_tx.send_replace(true);
            }
            Err(e) => {
                // Dropping the sender would read as a shutdown request.
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    });

    run_with_shutdown(&config, shutdown_rx).await?;

    info!("storewatch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn overrides_mirror_flags() {
        let args = RunArgs {
            config: PathBuf::from("config.toml"),
            seller_id: Some("1".into()),
            chats_file: None,
            cache_file: Some(PathBuf::from("c.json")),
            token: Some("t".into()),
            debug: false,
            json_logs: true,
            no_prime: true,
        };

        let overrides = args.overrides();
        assert_eq!(overrides.seller_id.as_deref(), Some("1"));
        assert_eq!(overrides.cache_path, Some(PathBuf::from("c.json")));
        assert_eq!(overrides.bot_token.as_deref(), Some("t"));
        assert!(overrides.json_logs);
        assert!(overrides.no_prime);
        assert!(!overrides.debug);
    }
}
