//! In-memory [`Storage`] for tests.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::port::outbound::Storage;

/// Storage held in memory, with switchable failures.
///
/// A failed write leaves the previous contents untouched, matching the
/// atomicity contract of real storage.
#[derive(Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        let storage = Self::default();
        *storage.contents.lock() = Some(bytes);
        storage
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        self.contents()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read failure injected").into());
        }
        Ok(self.contents.lock().clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "write failure injected").into());
        }
        *self.contents.lock() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
