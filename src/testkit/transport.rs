//! Recording [`Transport`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ChatId;
use crate::error::DeliveryError;
use crate::port::outbound::Transport;

#[derive(Default)]
struct Inner {
    sent: Mutex<Vec<(ChatId, String)>>,
    failing: Mutex<HashSet<ChatId>>,
    fail_next: AtomicUsize,
    delays: Mutex<HashMap<ChatId, Duration>>,
    delay_all: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Thread-safe message collector with injectable failures and delays.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Inner>,
}

struct InFlight<'a>(&'a Inner);

impl<'a> InFlight<'a> {
    fn enter(inner: &'a Inner) -> Self {
        let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `chat` fails.
    pub fn fail_chat(&self, chat: ChatId) {
        self.inner.failing.lock().insert(chat);
    }

    /// The next `count` sends fail, whichever chat they target.
    pub fn fail_next(&self, count: usize) {
        self.inner.fail_next.store(count, Ordering::SeqCst);
    }

    /// Sends to `chat` take `delay`.
    pub fn delay_chat(&self, chat: ChatId, delay: Duration) {
        self.inner.delays.lock().insert(chat, delay);
    }

    /// Every send takes `delay`.
    pub fn delay_all(&self, delay: Duration) {
        *self.inner.delay_all.lock() = Some(delay);
    }

    /// Messages delivered to `chat`, in delivery order.
    pub fn sent_to(&self, chat: ChatId) -> Vec<String> {
        self.inner
            .sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.inner.sent.lock().len()
    }

    /// Highest number of sends observed in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        let _guard = InFlight::enter(&self.inner);

        let delay = self
            .inner
            .delays
            .lock()
            .get(&chat)
            .copied()
            .or(*self.inner.delay_all.lock());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let injected = self
            .inner
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected || self.inner.failing.lock().contains(&chat) {
            return Err(DeliveryError::Transport(format!("send to {chat} failed")));
        }

        self.inner.sent.lock().push((chat, text.to_string()));
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}
