//! Change events produced by detection.

use super::{ListingAttributes, ListingId, ListingRecord};

/// A listing that should be announced this cycle.
///
/// Events are transient: they live for one cycle and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The listing id has never been announced.
    New(ListingRecord),
    /// The listing was announced before and a tracked attribute changed.
    Updated {
        current: ListingRecord,
        previous: ListingAttributes,
    },
}

impl ChangeEvent {
    #[must_use]
    pub fn listing_id(&self) -> &ListingId {
        &self.record().id
    }

    /// The listing as currently observed.
    #[must_use]
    pub fn record(&self) -> &ListingRecord {
        match self {
            Self::New(record) => record,
            Self::Updated { current, .. } => current,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::New(_) => "new",
            Self::Updated { .. } => "updated",
        }
    }
}
