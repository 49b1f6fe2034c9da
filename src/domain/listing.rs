//! Catalog listings and the snapshot of listings already announced.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ListingId;

/// Attributes compared between cycles to decide whether a listing changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingAttributes {
    pub title: String,
    pub price: Decimal,
    pub available: bool,
}

/// A single listing as observed in the seller's catalog.
///
/// `url` is carried for display only and never takes part in change
/// detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    #[serde(flatten)]
    pub attributes: ListingAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When this version of the listing was observed. Once cached, it is
    /// the time it was last announced: re-observing an unchanged listing
    /// does not touch it.
    #[serde(alias = "last_seen")]
    pub announced_at: DateTime<Utc>,
}

impl ListingRecord {
    /// Create a record observed now.
    pub fn new(
        id: impl Into<ListingId>,
        title: impl Into<String>,
        price: Decimal,
        available: bool,
    ) -> Self {
        Self {
            id: id.into(),
            attributes: ListingAttributes {
                title: title.into(),
                price,
                available,
            },
            url: None,
            announced_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.attributes.title
    }

    #[must_use]
    pub fn price(&self) -> Decimal {
        self.attributes.price
    }
}

/// Everything that has already been announced, keyed by listing id.
///
/// A map keeps at most one record per id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    listings: BTreeMap<ListingId, ListingRecord>,
}

impl CacheSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &ListingId) -> bool {
        self.listings.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &ListingId) -> Option<&ListingRecord> {
        self.listings.get(id)
    }

    /// Insert or replace the record for its id.
    pub fn upsert(&mut self, record: ListingRecord) {
        self.listings.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ListingRecord> {
        self.listings.values()
    }
}

impl FromIterator<ListingRecord> for CacheSnapshot {
    fn from_iter<I: IntoIterator<Item = ListingRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.upsert(record);
        }
        snapshot
    }
}
