use teloxide::prelude::*;
use teloxide::types::BotCommand as MenuCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::command::bot_commands;
use crate::port::inbound::InboundCommand;

/// Register bot commands with Telegram for the "/" menu.
pub async fn register_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<MenuCommand> = bot_commands()
        .into_iter()
        .map(|(cmd, desc)| MenuCommand::new(cmd, desc))
        .collect();

    bot.set_my_commands(commands).await?;
    info!("Registered bot commands with Telegram");
    Ok(())
}

/// Long-poll for updates and forward every text message to `commands`.
///
/// The returned task runs until it is aborted or the receiving side of
/// `commands` is dropped.
pub fn spawn_update_listener(bot: Bot, commands: mpsc::Sender<InboundCommand>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = register_bot_commands(&bot).await {
            warn!(error = %e, "Failed to register bot commands with Telegram");
        }

        info!("Telegram update listener started");

        teloxide::repl(bot, move |msg: Message| {
            let commands = commands.clone();
            async move {
                let Some(text) = msg.text() else {
                    return respond(());
                };

                debug!(chat = msg.chat.id.0, "Received message");
                if commands
                    .send(InboundCommand::new(msg.chat.id.0, text))
                    .await
                    .is_err()
                {
                    warn!("Command handler is gone, dropping message");
                }

                respond(())
            }
        })
        .await;

        warn!("Telegram update listener stopped");
    })
}
