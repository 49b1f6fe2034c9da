//! Registry of chats subscribed to notifications.
//!
//! Shared between the polling task (reads) and the command handler
//! (writes). Writers are serialized by their own mutex and build the next
//! set off to the side; the read lock is only taken for the swap after the
//! durable write succeeded, so readers never wait on the disk and never see
//! a mutation that failed to persist.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::domain::ChatId;
use crate::error::StoreError;
use crate::port::outbound::Storage;

/// Durable set of subscribed chats.
pub struct ChatRegistry {
    chats: RwLock<BTreeSet<ChatId>>,
    writer: Mutex<()>,
    storage: Arc<dyn Storage>,
}

impl ChatRegistry {
    /// Load the registry from `storage`.
    ///
    /// The stored format is one chat id per line. Blank lines and
    /// duplicates are tolerated; lines that are not chat ids are skipped
    /// with a warning.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self, StoreError> {
        let chats = match storage.read()? {
            Some(bytes) => parse_lines(&String::from_utf8_lossy(&bytes)),
            None => BTreeSet::new(),
        };

        info!(location = %storage.describe(), chats = chats.len(), "Chat registry loaded");

        Ok(Self {
            chats: RwLock::new(chats),
            writer: Mutex::new(()),
            storage,
        })
    }

    /// Add `chat`. Returns `true` if it was not registered before.
    pub fn subscribe(&self, chat: ChatId) -> Result<bool, StoreError> {
        let Some(total) = self.update(|chats| chats.insert(chat))? else {
            return Ok(false);
        };
        info!(chat = %chat, total = total, "Chat subscribed");
        Ok(true)
    }

    /// Remove `chat`. Returns `true` if it was registered.
    pub fn unsubscribe(&self, chat: ChatId) -> Result<bool, StoreError> {
        let Some(total) = self.update(|chats| chats.remove(&chat))? else {
            return Ok(false);
        };
        info!(chat = %chat, total = total, "Chat unsubscribed");
        Ok(true)
    }

    /// Copy of the registered chats, safe to iterate while the registry
    /// keeps changing.
    #[must_use]
    pub fn list(&self) -> Vec<ChatId> {
        self.chats.read().iter().copied().collect()
    }

    #[must_use]
    pub fn contains(&self, chat: ChatId) -> bool {
        self.chats.read().contains(&chat)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chats.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chats.read().is_empty()
    }

    /// Apply `mutate` to a copy, persist it and publish it. Returns the new
    /// size, or `None` when `mutate` reported no change.
    fn update(
        &self,
        mutate: impl FnOnce(&mut BTreeSet<ChatId>) -> bool,
    ) -> Result<Option<usize>, StoreError> {
        let _writer = self.writer.lock();
        let mut next = self.chats.read().clone();
        if !mutate(&mut next) {
            return Ok(None);
        }

        self.persist(&next)?;
        let total = next.len();
        *self.chats.write() = next;
        Ok(Some(total))
    }

    fn persist(&self, chats: &BTreeSet<ChatId>) -> Result<(), StoreError> {
        let mut contents = String::with_capacity(chats.len() * 12);
        for chat in chats {
            contents.push_str(&chat.to_string());
            contents.push('\n');
        }
        self.storage.write(contents.as_bytes())
    }
}

fn parse_lines(contents: &str) -> BTreeSet<ChatId> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<ChatId>() {
            Ok(chat) => Some(chat),
            Err(e) => {
                warn!(line = %line, error = %e, "Skipping invalid chat id");
                None
            }
        })
        .collect()
}
