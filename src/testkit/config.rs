//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests, tuned so
//! that nothing waits for long.

use std::time::Duration;

use crate::application::broadcast::BroadcastConfig;
use crate::application::scheduler::SchedulerConfig;

/// Broadcast config with short timeouts.
pub fn broadcast() -> BroadcastConfig {
    BroadcastConfig {
        concurrency: 4,
        send_timeout: Duration::from_millis(500),
        shutdown_grace: Duration::from_millis(100),
    }
}

/// Scheduler config polling every `interval_ms`, without priming.
pub fn scheduler(interval_ms: u64) -> SchedulerConfig {
    SchedulerConfig {
        seller_id: "seller-1".to_string(),
        poll_interval: Duration::from_millis(interval_ms),
        fetch_timeout: Duration::from_secs(1),
        sort_by_id: true,
        prime_on_empty: false,
    }
}
