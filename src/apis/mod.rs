/// Remote listing data source
///
/// `ListingSource` is the seam between the engine and the network: the engine
/// only ever asks for one 1-based page at a time.
pub mod client;
pub mod coinmarketcap;
pub mod stats;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::errors::CoinListError;
use crate::types::ListingResponse;

pub use coinmarketcap::CoinMarketCapClient;
pub use stats::{ApiStats, ApiStatsTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Anything other than "asc" sorts descending
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// One page request against the listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub convert: Vec<String>,
    pub crypto_type: String,
    pub tag_type: String,
    pub audited: bool,
    pub aux: Vec<String>,
}

impl ListingRequest {
    /// 1-based offset of the first record: `(page - 1) * page_size + 1`
    pub fn start(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64 + 1
    }
}

/// Request parameters that stay fixed for a session
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDefaults {
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub convert: Vec<String>,
    pub crypto_type: String,
    pub tag_type: String,
    pub audited: bool,
    pub aux: Vec<String>,
}

impl ListingDefaults {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            sort_by: api.sort_by.clone(),
            sort_direction: SortDirection::parse(&api.sort_direction),
            convert: api.convert.clone(),
            crypto_type: api.crypto_type.clone(),
            tag_type: api.tag_type.clone(),
            audited: api.audited,
            aux: api.aux.clone(),
        }
    }

    pub fn request(&self, page: u32, page_size: u32) -> ListingRequest {
        ListingRequest {
            page: page.max(1),
            page_size,
            sort_by: self.sort_by.clone(),
            sort_direction: self.sort_direction,
            convert: self.convert.clone(),
            crypto_type: self.crypto_type.clone(),
            tag_type: self.tag_type.clone(),
            audited: self.audited,
            aux: self.aux.clone(),
        }
    }
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page. The response status block has already been checked.
    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingResponse, CoinListError>;
}
