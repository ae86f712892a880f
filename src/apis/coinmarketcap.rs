/// CoinMarketCap data-api listing client
///
/// Endpoint: `GET /data-api/v3/cryptocurrency/listing`
///
/// Query: `start` (1-based offset), `limit`, `sortBy`, `sortType`, `convert`
/// (comma separated), `cryptoType`, `tagType`, `audited`, `aux` (comma separated).
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use super::client::{HttpClient, RateLimiter};
use super::stats::{ApiStats, ApiStatsTracker};
use super::{ListingRequest, ListingSource};
use crate::config::ApiConfig;
use crate::errors::{CoinListError, ParseError, RemoteFetchError};
use crate::logger::{self, LogTag};
use crate::types::ListingResponse;

const ENDPOINT: &str = "listing";

/// Bytes of an error body kept in `RemoteFetchError::HttpStatus`
const MAX_ERROR_BODY: usize = 200;

pub struct CoinMarketCapClient {
    http: HttpClient,
    limiter: RateLimiter,
    stats: Arc<ApiStatsTracker>,
    base_url: Url,
}

impl CoinMarketCapClient {
    pub fn new(config: &ApiConfig) -> Result<Self, CoinListError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CoinListError::Config(format!("invalid api.base_url '{}': {}", config.base_url, e))
        })?;

        Ok(Self {
            http: HttpClient::new(config.timeout_seconds)?,
            limiter: RateLimiter::new(config.rate_limit_per_minute as usize),
            stats: Arc::new(ApiStatsTracker::new()),
            base_url,
        })
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.stats.get_stats().await
    }

    /// Full request URL for one listing page
    pub fn build_url(&self, request: &ListingRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("start", &request.start().to_string())
            .append_pair("limit", &request.page_size.to_string())
            .append_pair("sortBy", &request.sort_by)
            .append_pair("sortType", request.sort_direction.as_str())
            .append_pair("convert", &request.convert.join(","))
            .append_pair("cryptoType", &request.crypto_type)
            .append_pair("tagType", &request.tag_type)
            .append_pair("audited", if request.audited { "true" } else { "false" })
            .append_pair("aux", &request.aux.join(","));
        url
    }

    async fn execute(&self, request: &ListingRequest) -> Result<(String, f64), CoinListError> {
        let url = self.build_url(request);
        let _guard = self.limiter.acquire().await?;

        logger::debug(
            LogTag::Api,
            &format!(
                "GET listing page={} limit={} start={}",
                request.page,
                request.page_size,
                request.start()
            ),
        );

        let start = Instant::now();
        let result = self
            .http
            .client()
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await;
        let elapsed = start.elapsed().as_millis() as f64;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let error = self.http.map_send_error(ENDPOINT, err);
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(ENDPOINT, error.to_string()).await;
                return Err(error.into());
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoinListError::from(self.http.map_send_error(ENDPOINT, e))
        });
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(ENDPOINT, err.to_string()).await;
                return Err(err);
            }
        };

        if !status.is_success() {
            self.stats.record_request(false, elapsed).await;
            self.stats
                .record_error(ENDPOINT, format!("HTTP {}", status.as_u16()))
                .await;
            return Err(RemoteFetchError::HttpStatus {
                endpoint: ENDPOINT.to_string(),
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            }
            .into());
        }

        Ok((body, elapsed))
    }
}

/// Decode a listing body and reject API-level failures
pub fn parse_listing_body(body: &str) -> Result<ListingResponse, ParseError> {
    let response: ListingResponse =
        serde_json::from_str(body).map_err(|e| ParseError::MalformedResponse {
            reason: e.to_string(),
        })?;
    response.check_status()?;
    Ok(response)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[async_trait]
impl ListingSource for CoinMarketCapClient {
    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingResponse, CoinListError> {
        let (body, elapsed) = self.execute(request).await?;

        match parse_listing_body(&body) {
            Ok(response) => {
                self.stats.record_request(true, elapsed).await;
                logger::verbose(
                    LogTag::Api,
                    &format!(
                        "Listing page {} returned {} records in {:.0}ms",
                        request.page,
                        response.records().len(),
                        elapsed
                    ),
                );
                Ok(response)
            }
            Err(err) => {
                self.stats.record_request(false, elapsed).await;
                self.stats.record_error(ENDPOINT, err.to_string()).await;
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::ListingDefaults;

    fn client() -> CoinMarketCapClient {
        CoinMarketCapClient::new(&ApiConfig::default()).unwrap()
    }

    #[test]
    fn test_build_url_query() {
        let client = client();
        let request = ListingDefaults::default().request(3, 10);
        let url = client.build_url(&request);

        let pairs: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(pairs["start"], "21");
        assert_eq!(pairs["limit"], "10");
        assert_eq!(pairs["sortBy"], "rank");
        assert_eq!(pairs["sortType"], "desc");
        assert_eq!(pairs["convert"], "USD,BTC,ETH");
        assert_eq!(pairs["cryptoType"], "all");
        assert_eq!(pairs["tagType"], "all");
        assert_eq!(pairs["audited"], "false");
        assert!(pairs["aux"].contains("circulating_supply"));
        assert!(url
            .as_str()
            .starts_with("https://api.coinmarketcap.com/data-api/v3/cryptocurrency/listing?"));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            CoinMarketCapClient::new(&config),
            Err(CoinListError::Config(_))
        ));
    }

    #[test]
    fn test_parse_listing_body() {
        let body = r#"{"data": {"cryptoCurrencyList": [{"id": 1, "name": "Bitcoin", "symbol": "BTC", "cmcRank": 1}], "totalCount": "500"}, "status": {"error_code": "0"}}"#;
        let response = parse_listing_body(body).unwrap();
        assert_eq!(response.records().len(), 1);
        assert_eq!(response.total_count().unwrap(), 500);

        assert!(matches!(
            parse_listing_body("<html>"),
            Err(ParseError::MalformedResponse { .. })
        ));
        let failed = r#"{"data": {"cryptoCurrencyList": [], "totalCount": "0"}, "status": {"error_code": "1006", "error_message": "Invalid"}}"#;
        assert!(matches!(
            parse_listing_body(failed),
            Err(ParseError::ApiStatus { .. })
        ));
    }

    #[test]
    fn test_truncate_keeps_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "é...");
    }
}
