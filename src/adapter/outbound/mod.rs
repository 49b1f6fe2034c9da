//! Outbound adapters (driven side).

pub mod catalog;
pub mod file;
pub mod log;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use catalog::{expand_catalog_url, HttpCatalogFetcher};
pub use file::FileStorage;
pub use log::LogTransport;
