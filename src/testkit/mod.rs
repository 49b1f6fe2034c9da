//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`storage`] - In-memory [`Storage`](crate::port::outbound::Storage) with
//!   switchable read/write failures.
//! - [`catalog`] - `ScriptedFetcher`, a catalog that replays queued responses.
//! - [`transport`] - `RecordingTransport`, which records sends and can fail or
//!   stall chosen chats.
//! - [`domain`] - Builders for listings.
//! - [`config`] - Canonical fast configurations for scheduler and broadcast.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod storage;
pub mod transport;
