/// Listing data model shared by the API client, the page store and the engine.

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ParseError;

/// Quote currency used when a caller does not name one
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";

// =============================================================================
// RECORDS
// =============================================================================

/// Per-currency market figures of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    pub name: String,
    pub price: f64,
    pub volume24h: f64,
    pub volume7d: Option<f64>,
    pub volume30d: Option<f64>,
    pub volume_percent_change: Option<f64>,
    pub market_cap: f64,
    pub self_reported_market_cap: Option<f64>,
    pub percent_change1h: f64,
    pub percent_change24h: f64,
    pub percent_change7d: f64,
    pub percent_change30d: Option<f64>,
    pub percent_change60d: Option<f64>,
    pub percent_change90d: Option<f64>,
    pub percent_change1y: Option<f64>,
    #[serde(rename = "fullyDilluttedMarketCap")]
    pub fully_diluted_market_cap: Option<f64>,
    pub market_cap_by_total_supply: Option<f64>,
    pub dominance: Option<f64>,
    pub turnover: Option<f64>,
    pub ytd_price_change_percentage: Option<f64>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditInfo {
    pub coin_id: String,
    pub auditor: String,
    pub audit_status: i64,
    pub audit_time: Option<String>,
    pub report_url: String,
    pub score: Option<String>,
    pub contract_address: Option<String>,
    pub contract_platform: Option<String>,
}

/// One asset as returned by the listing endpoint.
///
/// `timestamp` is local cache metadata (epoch ms of the last store write) and is
/// never part of what the remote returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CryptoRecord {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub slug: String,
    pub cmc_rank: u32,
    pub market_pair_count: u32,
    pub circulating_supply: f64,
    pub self_reported_circulating_supply: Option<f64>,
    pub total_supply: f64,
    pub max_supply: Option<f64>,
    pub ath: Option<f64>,
    pub atl: Option<f64>,
    pub high24h: Option<f64>,
    pub low24h: Option<f64>,
    pub is_active: u8,
    pub last_updated: String,
    pub date_added: String,
    pub quotes: Vec<Quote>,
    pub is_audited: bool,
    pub audit_info_list: Vec<AuditInfo>,
    pub badges: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl CryptoRecord {
    /// Quote for a currency name such as "USD" (case-insensitive)
    pub fn quote(&self, currency: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|q| q.name.eq_ignore_ascii_case(currency))
    }

    pub fn usd_quote(&self) -> Option<&Quote> {
        self.quote(DEFAULT_QUOTE_CURRENCY)
    }

    /// Canonical record without local cache metadata
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }
}

// =============================================================================
// PAGES AND METADATA
// =============================================================================

/// Physical page address: 0-based index under a given page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub index: u32,
    pub size: u32,
}

impl PageKey {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    /// 1-based page number in the remote protocol
    pub fn remote_page(&self) -> u32 {
        self.index + 1
    }

    /// Absolute (0-based) position of the first record of this page
    pub fn start_index(&self) -> usize {
        self.index as usize * self.size as usize
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} (size {})", self.index, self.size)
    }
}

/// Independently cached top-of-list records for instant first paint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<CryptoRecord>,
    pub timestamp: i64,
}

// =============================================================================
// LISTING RESPONSE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    #[serde(default)]
    pub crypto_currency_list: Vec<CryptoRecord>,
    #[serde(deserialize_with = "string_or_number")]
    pub total_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ListingStatus {
    pub timestamp: String,
    #[serde(deserialize_with = "string_or_number")]
    pub error_code: String,
    pub error_message: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub elapsed: String,
    pub credit_count: u32,
}

/// Body of one listing page response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListingResponse {
    pub data: ListingData,
    #[serde(default)]
    pub status: ListingStatus,
}

impl ListingResponse {
    pub fn records(&self) -> &[CryptoRecord] {
        &self.data.crypto_currency_list
    }

    pub fn into_records(self) -> Vec<CryptoRecord> {
        self.data.crypto_currency_list
    }

    /// Parse the string-typed total count
    pub fn total_count(&self) -> Result<u64, ParseError> {
        parse_total_count(&self.data.total_count)
    }

    /// Reject bodies whose status block reports an API-level error
    pub fn check_status(&self) -> Result<(), ParseError> {
        let code = self.status.error_code.trim();
        if code.is_empty() || code == "0" {
            return Ok(());
        }
        Err(ParseError::ApiStatus {
            code: code.to_string(),
            message: self
                .status
                .error_message
                .clone()
                .unwrap_or_else(|| "no message".to_string()),
        })
    }
}

pub fn parse_total_count(raw: &str) -> Result<u64, ParseError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidTotalCount {
            value: raw.to_string(),
        })
}

/// The listing API is inconsistent about quoting numeric status fields
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": {
            "cryptoCurrencyList": [{
                "id": 1,
                "name": "Bitcoin",
                "symbol": "BTC",
                "slug": "bitcoin",
                "cmcRank": 1,
                "marketPairCount": 11000,
                "circulatingSupply": 19700000,
                "totalSupply": 19700000,
                "maxSupply": 21000000,
                "isActive": 1,
                "lastUpdated": "2024-05-01T00:00:00.000Z",
                "dateAdded": "2010-07-13T00:00:00.000Z",
                "quotes": [{
                    "name": "USD",
                    "price": 60000.5,
                    "volume24h": 1.5e10,
                    "marketCap": 1.2e12,
                    "percentChange1h": 0.1,
                    "percentChange24h": -1.2,
                    "percentChange7d": 3.4,
                    "fullyDilluttedMarketCap": 1.26e12,
                    "lastUpdated": "2024-05-01T00:00:00.000Z"
                }],
                "isAudited": false,
                "auditInfoList": [],
                "badges": [1]
            }],
            "totalCount": "9876"
        },
        "status": {
            "timestamp": "2024-05-01T00:00:01.000Z",
            "error_code": "0",
            "error_message": "SUCCESS",
            "elapsed": "12",
            "credit_count": 0
        }
    }"#;

    #[test]
    fn test_parse_listing_response() {
        let response: ListingResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(response.records().len(), 1);
        assert_eq!(response.total_count().unwrap(), 9876);
        assert!(response.check_status().is_ok());

        let btc = &response.records()[0];
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.max_supply, Some(21_000_000.0));
        assert_eq!(btc.timestamp, None);

        let usd = btc.usd_quote().unwrap();
        assert_eq!(usd.price, 60000.5);
        assert_eq!(usd.fully_diluted_market_cap, Some(1.26e12));
        assert!(btc.quote("eur").is_none());
    }

    #[test]
    fn test_numeric_total_count_is_accepted() {
        let body = r#"{"data": {"cryptoCurrencyList": [], "totalCount": 500}}"#;
        let response: ListingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.total_count().unwrap(), 500);
    }

    #[test]
    fn test_non_numeric_total_count_is_parse_error() {
        let body = r#"{"data": {"cryptoCurrencyList": [], "totalCount": "lots"}}"#;
        let response: ListingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.total_count(),
            Err(ParseError::InvalidTotalCount {
                value: "lots".to_string()
            })
        );
    }

    #[test]
    fn test_api_status_error_is_reported() {
        let body = r#"{
            "data": {"cryptoCurrencyList": [], "totalCount": "0"},
            "status": {"error_code": 500, "error_message": "Internal"}
        }"#;
        let response: ListingResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.check_status(),
            Err(ParseError::ApiStatus { ref code, .. }) if code == "500"
        ));
    }

    #[test]
    fn test_cache_timestamp_not_serialized_when_absent() {
        let record = CryptoRecord {
            id: 7,
            symbol: "DOT".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("timestamp"));

        let stamped = CryptoRecord {
            timestamp: Some(42),
            ..record.clone()
        };
        assert_eq!(stamped.without_timestamp(), record);
    }

    #[test]
    fn test_page_key_addressing() {
        let key = PageKey::new(2, 50);
        assert_eq!(key.remote_page(), 3);
        assert_eq!(key.start_index(), 100);
    }
}
