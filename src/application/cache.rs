//! Durable record of listings that have already been announced.
//!
//! The [`CacheStore`] is owned by the polling task alone, so it takes
//! `&mut self` for mutation instead of locking. Every commit is
//! write-through: the snapshot is persisted before the commit returns, and a
//! failed write rolls the in-memory snapshot back to its pre-commit value.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{CacheSnapshot, ChangeEvent, ListingId, ListingRecord};
use crate::error::StoreError;
use crate::port::outbound::Storage;

/// In-memory cache snapshot backed by a durable [`Storage`].
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    snapshot: CacheSnapshot,
}

impl CacheStore {
    /// Load the snapshot from `storage`.
    ///
    /// Missing, unreadable or corrupt data yields an empty snapshot, unless
    /// `strict` is set, in which case the error is returned.
    pub fn load(storage: Arc<dyn Storage>, strict: bool) -> Result<Self, StoreError> {
        let snapshot = match storage.read() {
            Ok(None) if strict => return Err(StoreError::Missing(storage.describe())),
            Ok(None) => {
                debug!(location = %storage.describe(), "No cache found, starting empty");
                CacheSnapshot::new()
            }
            Ok(Some(bytes)) if bytes.iter().all(u8::is_ascii_whitespace) => CacheSnapshot::new(),
            Ok(Some(bytes)) => match serde_json::from_slice::<CacheSnapshot>(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) if strict => return Err(StoreError::Corrupt(e.to_string())),
                Err(e) => {
                    warn!(
                        location = %storage.describe(),
                        error = %e,
                        "Cache is corrupt, starting empty"
                    );
                    CacheSnapshot::new()
                }
            },
            Err(e) if strict => return Err(e),
            Err(e) => {
                warn!(
                    location = %storage.describe(),
                    error = %e,
                    "Cache is unreadable, starting empty"
                );
                CacheSnapshot::new()
            }
        };

        info!(
            location = %storage.describe(),
            listings = snapshot.len(),
            "Cache loaded"
        );

        Ok(Self { storage, snapshot })
    }

    #[must_use]
    pub fn contains(&self, id: &ListingId) -> bool {
        self.snapshot.contains(id)
    }

    #[must_use]
    pub fn get(&self, id: &ListingId) -> Option<&ListingRecord> {
        self.snapshot.get(id)
    }

    /// Current snapshot, for detection.
    #[must_use]
    pub fn snapshot(&self) -> &CacheSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Apply `events` and persist the result, all or nothing.
    ///
    /// Returns the number of records written. On any persistence error the
    /// in-memory snapshot is restored to what it was before the call.
    pub fn commit(&mut self, events: &[ChangeEvent]) -> Result<usize, StoreError> {
        if events.is_empty() {
            return Ok(0);
        }

        let previous = self.snapshot.clone();
        for event in events {
            self.snapshot.upsert(event.record().clone());
        }

        if let Err(e) = self.persist() {
            self.snapshot = previous;
            return Err(e);
        }

        debug!(records = events.len(), total = self.snapshot.len(), "Cache committed");
        Ok(events.len())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.snapshot).map_err(StoreError::Encode)?;
        self.storage.write(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::listing;
    use crate::testkit::storage::MemoryStorage;
    use rust_decimal_macros::dec;

    fn new_event(id: &str, price: rust_decimal::Decimal) -> ChangeEvent {
        ChangeEvent::New(listing(id, price))
    }

    #[test]
    fn load_missing_storage_is_empty_when_lenient() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CacheStore::load(storage, false).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_missing_storage_fails_when_strict() {
        let storage = Arc::new(MemoryStorage::new());
        let result = CacheStore::load(storage, true);
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[test]
    fn load_corrupt_storage_is_empty_when_lenient() {
        let storage = Arc::new(MemoryStorage::with_bytes(b"{ not json".to_vec()));
        let store = CacheStore::load(storage, false).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_corrupt_storage_fails_when_strict() {
        let storage = Arc::new(MemoryStorage::with_bytes(b"{ not json".to_vec()));
        let result = CacheStore::load(storage, true);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn load_unreadable_storage_respects_strict_flag() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail_reads(true);

        assert!(CacheStore::load(storage.clone(), false).unwrap().is_empty());
        assert!(matches!(
            CacheStore::load(storage, true),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn commit_persists_and_reloads() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CacheStore::load(storage.clone(), false).unwrap();

        let written = store.commit(&[new_event("A", dec!(10))]).unwrap();
        assert_eq!(written, 1);
        assert!(store.contains(&"A".into()));

        let reloaded = CacheStore::load(storage, true).unwrap();
        assert_eq!(reloaded.get(&"A".into()).unwrap().price(), dec!(10));
    }

    #[test]
    fn commit_of_nothing_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CacheStore::load(storage.clone(), false).unwrap();

        assert_eq!(store.commit(&[]).unwrap(), 0);
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn failed_commit_rolls_back_in_memory_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CacheStore::load(storage.clone(), false).unwrap();
        store.commit(&[new_event("A", dec!(10))]).unwrap();
        let before = store.snapshot().clone();

        storage.fail_writes(true);
        let result = store.commit(&[
            new_event("B", dec!(5)),
            ChangeEvent::Updated {
                current: listing("A", dec!(8)),
                previous: before.get(&"A".into()).unwrap().attributes.clone(),
            },
        ]);

        assert!(result.is_err());
        assert_eq!(store.snapshot(), &before);

        storage.fail_writes(false);
        let durable = CacheStore::load(storage, true).unwrap();
        assert_eq!(durable.snapshot(), &before);
    }
}
