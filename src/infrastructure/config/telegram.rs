//! Telegram bot configuration.

use serde::Deserialize;

const fn default_true() -> bool {
    true
}

/// Telegram bot configuration.
///
/// The token is a secret and is never read from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Use Telegram for notifications and commands when a token is present.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bot API token, from `TELEGRAM_BOT_TOKEN` or `--token`.
    #[serde(skip)]
    pub bot_token: Option<String>,
}

impl TelegramAppConfig {
    /// The token to use, if Telegram is enabled and one is configured.
    #[must_use]
    pub fn active_token(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.bot_token.as_deref().filter(|token| !token.is_empty())
    }
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bot_token: None,
        }
    }
}

/// Read `TELEGRAM_BOT_TOKEN`, ignoring blank values.
pub(crate) fn token_from_env() -> Option<String> {
    std::env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
