//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::ListingRecord;

/// An available listing titled `Listing {id}`.
pub fn listing(id: &str, price: Decimal) -> ListingRecord {
    ListingRecord::new(id, format!("Listing {id}"), price, true)
}
