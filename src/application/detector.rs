//! Change detection between the fetched catalog and the cache snapshot.
//!
//! Detection is a pure function: running it twice against the same inputs
//! yields the same events. Listings that disappeared from the catalog are
//! not reported and stay cached.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{CacheSnapshot, ChangeEvent, ListingId, ListingRecord};

/// Diff `current` against `snapshot`.
///
/// Events follow the order of `current`. If the same id appears more than
/// once in `current`, only its first occurrence is considered.
#[must_use]
pub fn detect(current: &[ListingRecord], snapshot: &CacheSnapshot) -> Vec<ChangeEvent> {
    let mut seen: HashSet<&ListingId> = HashSet::with_capacity(current.len());
    let mut events = Vec::new();

    for listing in current {
        if !seen.insert(&listing.id) {
            debug!(listing_id = %listing.id, "Duplicate listing in catalog, ignoring");
            continue;
        }

        match snapshot.get(&listing.id) {
            None => events.push(ChangeEvent::New(listing.clone())),
            Some(cached) if cached.attributes != listing.attributes => {
                events.push(ChangeEvent::Updated {
                    current: listing.clone(),
                    previous: cached.attributes.clone(),
                });
            }
            Some(_) => {}
        }
    }

    events
}

/// Order fetched listings by id so detection output does not depend on the
/// catalog's response order.
pub fn sort_by_id(listings: &mut [ListingRecord]) {
    listings.sort_by(|a, b| a.id.cmp(&b.id));
}
