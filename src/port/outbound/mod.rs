//! Outbound ports (driven side): interfaces implemented by outbound adapters.

pub mod catalog;
pub mod storage;
pub mod transport;

pub use catalog::CatalogFetcher;
pub use storage::Storage;
pub use transport::Transport;
