//! Durable byte storage port for file-backed state.

use crate::error::StoreError;

/// A durable medium holding one blob of state.
///
/// Implementations must make `write` atomic: after a failed write the
/// previously stored bytes are still readable.
pub trait Storage: Send + Sync {
    /// Read the stored bytes, or `None` if nothing has been stored yet.
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored bytes.
    fn write(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Human-readable location for logging.
    fn describe(&self) -> String;
}
