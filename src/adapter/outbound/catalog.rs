//! HTTP JSON catalog client.
//!
//! Fetches the seller's listings from a URL template in which `{seller_id}`
//! is substituted, percent-encoded for the path or query component it lands
//! in. The response body is either a JSON array of listings or an
//! object with an `items` array.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};
use url::{form_urlencoded, ParseError, Url};

use crate::domain::{ListingAttributes, ListingRecord};
use crate::error::FetchError;
use crate::port::outbound::CatalogFetcher;

/// Placeholder replaced by the seller id in a catalog URL template.
pub const SELLER_PLACEHOLDER: &str = "{seller_id}";

/// Stands in for the placeholder while the template is parsed.
const SELLER_MARKER: &str = "storewatch-seller-id-marker";

/// Expand a catalog URL template for `seller_id`.
///
/// The id is encoded as a single path segment where the placeholder sits in
/// the path, and form-encoded where it sits in the query, so ids containing
/// `/`, `?` or spaces cannot change the shape of the request.
///
/// # Errors
///
/// Returns an error if the template is not an absolute hierarchical URL.
pub fn expand_catalog_url(template: &str, seller_id: &str) -> Result<Url, ParseError> {
    let mut url = Url::parse(&template.replace(SELLER_PLACEHOLDER, SELLER_MARKER))?;

    if url.path().contains(SELLER_MARKER) {
        let mut segment = url.clone();
        segment
            .path_segments_mut()
            .map_err(|()| ParseError::RelativeUrlWithCannotBeABaseBase)?
            .clear()
            .push(seller_id);
        let encoded = segment.path().trim_start_matches('/').to_string();
        let path = url.path().replace(SELLER_MARKER, &encoded);
        url.set_path(&path);
    }

    if let Some(query) = url.query().filter(|q| q.contains(SELLER_MARKER)) {
        let encoded: String = form_urlencoded::byte_serialize(seller_id.as_bytes()).collect();
        let query = query.replace(SELLER_MARKER, &encoded);
        url.set_query(Some(&query));
    }

    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    Listings(Vec<ListingDto>),
    Wrapped { items: Vec<ListingDto> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdDto {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct ListingDto {
    id: IdDto,
    title: String,
    price: Decimal,
    #[serde(default = "default_available")]
    available: bool,
    #[serde(default)]
    url: Option<String>,
}

const fn default_available() -> bool {
    true
}

impl From<ListingDto> for ListingRecord {
    fn from(dto: ListingDto) -> Self {
        let id = match dto.id {
            IdDto::Text(id) => id,
            IdDto::Number(id) => id.to_string(),
        };
        Self {
            id: id.into(),
            attributes: ListingAttributes {
                title: dto.title,
                price: dto.price,
                available: dto.available,
            },
            url: dto.url,
            announced_at: Utc::now(),
        }
    }
}

/// Decode a catalog response body.
pub(crate) fn parse_listings(body: &[u8]) -> Result<Vec<ListingRecord>, FetchError> {
    let response: CatalogResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let listings = match response {
        CatalogResponse::Listings(items) | CatalogResponse::Wrapped { items } => items,
    };
    Ok(listings.into_iter().map(ListingRecord::from).collect())
}

/// [`CatalogFetcher`] backed by an HTTP endpoint.
pub struct HttpCatalogFetcher {
    http: HttpClient,
    url_template: String,
}

impl HttpCatalogFetcher {
    /// Create a fetcher for `url_template`.
    ///
    /// `request_timeout` bounds each request at the HTTP layer; the scheduler
    /// applies its own fetch timeout on top.
    #[must_use]
    pub fn new(url_template: impl Into<String>, request_timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .user_agent(concat!("storewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            url_template: url_template.into(),
        }
    }

    /// The request URL for `seller_id`.
    pub fn listings_url(&self, seller_id: &str) -> Result<Url, FetchError> {
        expand_catalog_url(&self.url_template, seller_id).map_err(FetchError::Url)
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    async fn fetch_listings(&self, seller_id: &str) -> Result<Vec<ListingRecord>, FetchError> {
        let url = self.listings_url(seller_id)?;
        debug!(url = %url, "Fetching catalog");

        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let listings = parse_listings(&body)?;
        debug!(count = listings.len(), "Catalog fetched");
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_bare_array() {
        let body = br#"[
            {"id": "A", "title": "Game A", "price": 10.5, "url": "https://store/a"},
            {"id": 7, "title": "Game B", "price": "3.99", "available": false}
        ]"#;

        let listings = parse_listings(body).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id.as_str(), "A");
        assert_eq!(listings[0].price(), dec!(10.5));
        assert!(listings[0].attributes.available);
        assert_eq!(listings[0].url.as_deref(), Some("https://store/a"));
        assert_eq!(listings[1].id.as_str(), "7");
        assert_eq!(listings[1].price(), dec!(3.99));
        assert!(!listings[1].attributes.available);
    }

    #[test]
    fn parses_wrapped_items() {
        let body = br#"{"items": [{"id": "X", "title": "Bundle", "price": 1}]}"#;

        let listings = parse_listings(body).unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title(), "Bundle");
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            parse_listings(b"<html>maintenance</html>"),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            parse_listings(br#"[{"id": "A"}]"#),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn seller_id_is_substituted() {
        let fetcher = HttpCatalogFetcher::new(
            "https://catalog.example/sellers/{seller_id}/listings",
            Duration::from_secs(5),
        );

        assert_eq!(
            fetcher.listings_url("42").unwrap().as_str(),
            "https://catalog.example/sellers/42/listings"
        );
    }

    #[test]
    fn seller_id_is_encoded_as_one_path_segment() {
        let url = expand_catalog_url(
            "https://catalog.example/sellers/{seller_id}/listings",
            "a/b?c d",
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://catalog.example/sellers/a%2Fb%3Fc%20d/listings"
        );
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
    }

    #[test]
    fn seller_id_in_query_is_form_encoded() {
        let url = expand_catalog_url(
            "https://catalog.example/listings?seller={seller_id}&page=1",
            "a&b c",
        )
        .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("seller".to_string(), "a&b c".to_string()),
                ("page".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn template_without_scheme_is_rejected() {
        assert!(expand_catalog_url("catalog.example/{seller_id}", "1").is_err());
    }
}
