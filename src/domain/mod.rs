//! Transport-agnostic domain types.

mod event;
mod id;
mod listing;

pub use event::ChangeEvent;
pub use id::{ChatId, ListingId};
pub use listing::{CacheSnapshot, ListingAttributes, ListingRecord};
