//! Composition root: builds the adapters and runs the service until shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::{FileStorage, HttpCatalogFetcher, LogTransport};
use crate::application::broadcast::Dispatcher;
use crate::application::cache::CacheStore;
use crate::application::command::CommandHandler;
use crate::application::lifecycle::shutdown_requested;
use crate::application::registry::ChatRegistry;
use crate::application::scheduler::Scheduler;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::InboundCommand;
use crate::port::outbound::Transport;

/// Buffered inbound commands before the listener waits on the handler.
const COMMAND_QUEUE: usize = 64;

/// Build the outbound transport and, when Telegram is active, start the
/// update listener feeding `commands`.
#[cfg(feature = "telegram")]
pub(crate) fn start_transport(
    config: &Config,
    commands: mpsc::Sender<InboundCommand>,
) -> (Arc<dyn Transport>, Option<JoinHandle<()>>) {
    use crate::adapter::outbound::telegram::{spawn_update_listener, TelegramTransport};

    if !config.telegram.enabled {
        info!("Telegram disabled, notifications go to the log");
        return (Arc::new(LogTransport), None);
    }
    let Some(token) = config.telegram.active_token() else {
        warn!("Telegram enabled but TELEGRAM_BOT_TOKEN not set, notifications go to the log");
        return (Arc::new(LogTransport), None);
    };

    let transport = TelegramTransport::new(token);
    let listener = spawn_update_listener(transport.bot(), commands);
    info!("Telegram transport enabled");
    (Arc::new(transport), Some(listener))
}

/// Build the outbound transport (non-telegram variant).
#[cfg(not(feature = "telegram"))]
pub(crate) fn start_transport(
    config: &Config,
    _commands: mpsc::Sender<InboundCommand>,
) -> (Arc<dyn Transport>, Option<JoinHandle<()>>) {
    if config.telegram.enabled {
        warn!("Built without the telegram feature, notifications go to the log");
    }
    (Arc::new(LogTransport), None)
}

/// Load state, build every component from `config` and run until `shutdown`
/// flips to `true` or its sender is dropped.
///
/// # Errors
///
/// Returns an error if the chat registry cannot be read, or if the cache is
/// missing or unreadable while `cache.strict` is set.
pub async fn run_with_shutdown(config: &Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let registry = Arc::new(ChatRegistry::load(Arc::new(FileStorage::new(
        &config.chats.path,
    )))?);
    let cache = CacheStore::load(
        Arc::new(FileStorage::new(&config.cache.path)),
        config.cache.strict,
    )?;
    info!(
        seller_id = %config.seller_id,
        chats = registry.len(),
        cached = cache.len(),
        "State loaded"
    );

    let scheduler_config = config.scheduler_config();
    let fetcher = Arc::new(HttpCatalogFetcher::new(
        config.catalog.url.clone(),
        scheduler_config.fetch_timeout,
    ));

    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);
    let (transport, listener) = start_transport(config, commands_tx.clone());

    let broadcast_config = config.broadcast_config();
    let handler = CommandHandler::new(
        Arc::clone(&registry),
        Arc::clone(&transport),
        broadcast_config.send_timeout,
    );
    let dispatcher = Dispatcher::new(transport, broadcast_config);
    let scheduler = Scheduler::new(scheduler_config, cache, fetcher, registry, dispatcher);

    let result = run_service(scheduler, handler, commands_rx, shutdown).await;

    if let Some(listener) = listener {
        listener.abort();
    }
    drop(commands_tx);
    result
}

/// Run the scheduler and the command handler side by side.
///
/// Both stop when `shutdown` fires. Returns once the scheduler has stopped
/// and the command handler has drained.
pub async fn run_service(
    mut scheduler: Scheduler,
    handler: CommandHandler,
    commands: mpsc::Receiver<InboundCommand>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let handle = scheduler.handle();
    let handler_task = tokio::spawn(handler.run(commands, handle.subscribe()));

    let stopper = {
        let handle = handle.clone();
        tokio::spawn(async move {
            shutdown_requested(&mut shutdown).await;
            info!("Shutdown requested");
            handle.stop();
        })
    };

    let result = scheduler.run().await;

    stopper.abort();
    handle.stop();
    if let Err(e) = handler_task.await {
        warn!(error = %e, "Command handler task failed");
    }

    info!(state = %scheduler.state(), "Service stopped");
    result
}
