//! Storewatch - Announces new and changed storefront listings to chat subscribers.
//!
//! The service polls one seller's catalog on a fixed interval, compares it
//! with a durable cache of listings already announced, and broadcasts every
//! new or changed listing to the chats subscribed through the bot.
//!
//! # Architecture
//!
//! - **`domain`** - Listings, the cache snapshot, change events, chat ids
//! - **`port`** - Traits for the catalog, the chat transport and durable storage
//! - **`application`** - Cache Store, change detector, chat registry,
//!   broadcast dispatcher, command handler and the polling scheduler
//! - **`adapter`** - File storage, HTTP catalog, log and Telegram transports
//! - **`infrastructure`** - Configuration and runtime wiring
//!
//! # Features
//!
//! - `telegram` - Telegram Bot API transport and command listener (default)
//! - `testkit` - Test fakes for integration tests

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
