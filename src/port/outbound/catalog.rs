//! Catalog port: where the seller's current listings come from.

use async_trait::async_trait;

use crate::domain::ListingRecord;
use crate::error::FetchError;

/// Source of the current listings for one seller.
///
/// Errors are transient by default; callers treat every error as
/// "skip this cycle" and never distinguish between variants.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch every listing currently published by `seller_id`.
    async fn fetch_listings(&self, seller_id: &str) -> Result<Vec<ListingRecord>, FetchError>;

    /// Get the source name for logging.
    fn source_name(&self) -> &'static str;
}
