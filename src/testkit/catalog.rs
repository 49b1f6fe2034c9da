//! Scripted [`CatalogFetcher`] for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ListingRecord;
use crate::error::FetchError;
use crate::port::outbound::CatalogFetcher;

#[derive(Debug, Clone)]
enum Step {
    Listings(Vec<ListingRecord>),
    Fail(u16),
}

/// A catalog that replays queued responses.
///
/// Each fetch pops the next step. Once the queue is exhausted the last
/// successful listing set is returned again, like a catalog that stopped
/// changing.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    steps: Arc<Mutex<VecDeque<Step>>>,
    steady: Arc<Mutex<Vec<ListingRecord>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn then_listings(self, listings: Vec<ListingRecord>) -> Self {
        self.push_listings(listings);
        self
    }

    /// Queue a failed response with the given HTTP status.
    pub fn then_fail(self, status: u16) -> Self {
        self.steps.lock().push_back(Step::Fail(status));
        self
    }

    /// Queue a successful response on a fetcher already in use.
    pub fn push_listings(&self, listings: Vec<ListingRecord>) {
        self.steps.lock().push_back(Step::Listings(listings));
    }

    /// Make every fetch take `delay` before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogFetcher for ScriptedFetcher {
    async fn fetch_listings(&self, _seller_id: &str) -> Result<Vec<ListingRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Listings(listings)) => {
                *self.steady.lock() = listings.clone();
                Ok(listings)
            }
            Some(Step::Fail(status)) => Err(FetchError::Status(status)),
            None => Ok(self.steady.lock().clone()),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}
