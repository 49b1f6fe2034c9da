//! Fan-out of change notifications to every subscribed chat.
//!
//! Each chat gets its own task that sends the cycle's events in detection
//! order, so every chat sees the same relative ordering. A semaphore bounds
//! how many chats are served at once. Failures are isolated per
//! (event, chat) pair and recorded, never retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::lifecycle::shutdown_requested;
use super::message::format_event;
use crate::domain::{ChangeEvent, ChatId, ListingId};
use crate::error::DeliveryError;
use crate::port::outbound::Transport;

/// Limits applied to one broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Maximum number of chats served concurrently. Values below 1 are
    /// treated as 1.
    pub concurrency: usize,
    /// Timeout for a single send; a timed-out send counts as failed.
    pub send_timeout: Duration,
    /// How long in-flight sends may finish after shutdown is requested.
    pub shutdown_grace: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            send_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// One failed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub listing_id: ListingId,
    pub chat: ChatId,
    pub error: DeliveryError,
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sends actually issued, including ones abandoned at shutdown.
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<DeliveryFailure>,
    /// True when shutdown cut the broadcast short.
    pub cancelled: bool,
}

impl BroadcastReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Running totals shared by the per-chat tasks.
///
/// Sends are counted here as they are issued, so a task aborted after the
/// shutdown grace period still shows up in the report.
#[derive(Debug, Default)]
struct Tally {
    attempted: usize,
    succeeded: usize,
    failures: Vec<DeliveryFailure>,
    /// The send each chat is currently waiting on.
    in_flight: HashMap<ChatId, ListingId>,
}

impl Tally {
    fn issue(&mut self, chat: ChatId, listing_id: &ListingId) {
        self.attempted += 1;
        self.in_flight.insert(chat, listing_id.clone());
    }

    fn settle(
        &mut self,
        chat: ChatId,
        listing_id: &ListingId,
        result: Result<(), DeliveryError>,
    ) {
        self.in_flight.remove(&chat);
        match result {
            Ok(()) => self.succeeded += 1,
            Err(error) => self.failures.push(DeliveryFailure {
                listing_id: listing_id.clone(),
                chat,
                error,
            }),
        }
    }

    fn into_report(mut self, cancelled: bool) -> BroadcastReport {
        let mut abandoned: Vec<_> = self.in_flight.drain().collect();
        abandoned.sort_by_key(|(chat, _)| *chat);
        for (chat, listing_id) in abandoned {
            self.failures.push(DeliveryFailure {
                listing_id,
                chat,
                error: DeliveryError::Abandoned,
            });
        }
        BroadcastReport {
            attempted: self.attempted,
            succeeded: self.succeeded,
            failures: self.failures,
            cancelled,
        }
    }
}

/// Sends formatted events through a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    config: BroadcastConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: BroadcastConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Send every event to every chat.
    ///
    /// If `shutdown` fires, no new sends are issued; sends already in flight
    /// get `shutdown_grace` to finish and are then abandoned. Abandoned sends
    /// count as attempted and are reported as [`DeliveryError::Abandoned`].
    pub async fn broadcast(
        &self,
        events: &[ChangeEvent],
        chats: &[ChatId],
        shutdown: &watch::Receiver<bool>,
    ) -> BroadcastReport {
        if events.is_empty() || chats.is_empty() {
            return BroadcastReport::default();
        }
        if *shutdown.borrow() {
            return BroadcastReport {
                cancelled: true,
                ..BroadcastReport::default()
            };
        }

        let messages: Arc<Vec<(ListingId, String)>> = Arc::new(
            events
                .iter()
                .map(|event| (event.listing_id().clone(), format_event(event)))
                .collect(),
        );
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let tally = Arc::new(Mutex::new(Tally::default()));
        let mut tasks = JoinSet::new();

        for &chat in chats {
            tasks.spawn(send_to_chat(
                chat,
                Arc::clone(&messages),
                Arc::clone(&self.transport),
                Arc::clone(&permits),
                Arc::clone(&tally),
                self.config.send_timeout,
                shutdown.clone(),
            ));
        }

        let mut cancelled = false;
        let mut stop = shutdown.clone();
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => warn!(error = %e, "Broadcast task failed"),
                    None => break,
                },
                () = shutdown_requested(&mut stop) => {
                    cancelled = true;
                    break;
                }
            }
        }

        if cancelled {
            let grace = self.config.shutdown_grace;
            let drained = tokio::time::timeout(grace, async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!(grace = ?grace, "Abandoning in-flight sends after grace period");
            }
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let report = std::mem::take(&mut *tally.lock()).into_report(cancelled);

        info!(
            events = events.len(),
            chats = chats.len(),
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            cancelled = report.cancelled,
            transport = self.transport.transport_name(),
            "Broadcast finished"
        );

        report
    }
}

async fn send_to_chat(
    chat: ChatId,
    messages: Arc<Vec<(ListingId, String)>>,
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
    tally: Arc<Mutex<Tally>>,
    send_timeout: Duration,
    shutdown: watch::Receiver<bool>,
) {
    let Ok(_permit) = permits.acquire_owned().await else {
        return;
    };

    for (listing_id, text) in messages.iter() {
        if *shutdown.borrow() {
            debug!(chat = %chat, "Shutdown requested, not sending further events");
            break;
        }

        tally.lock().issue(chat, listing_id);
        let result = match tokio::time::timeout(send_timeout, transport.send_message(chat, text))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(send_timeout)),
        };

        if let Err(error) = &result {
            warn!(chat = %chat, listing_id = %listing_id, error = %error, "Delivery failed");
        }
        tally.lock().settle(chat, listing_id, result);
    }
}
