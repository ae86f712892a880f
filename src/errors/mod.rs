/// Structured error handling for the listing cache
///
/// Three failure families cross module boundaries:
/// - `RemoteFetch`: the listing API could not be reached or answered non-2xx
/// - `Storage`: the persistent page store is unavailable or a write failed
/// - `Parse`: the listing response (or its total count) is malformed
///
/// The engine never propagates these to its caller; it records them in state.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoinListError>;

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoinListError {
    #[error("Remote fetch error: {0}")]
    RemoteFetch(#[from] RemoteFetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoinListError {
    /// Transient failures that a later refresh may clear on its own
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoinListError::RemoteFetch(e) => e.is_recoverable(),
            CoinListError::Storage(StorageError::Busy { .. }) => true,
            CoinListError::Storage(_) => false,
            CoinListError::Parse(_) => false,
            CoinListError::Config(_) => false,
        }
    }

    /// Short family label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            CoinListError::RemoteFetch(_) => "remote",
            CoinListError::Storage(_) => "storage",
            CoinListError::Parse(_) => "parse",
            CoinListError::Config(_) => "config",
        }
    }
}

// =============================================================================
// REMOTE FETCH ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteFetchError {
    #[error("request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("HTTP {status} from {endpoint}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("rate limiter unavailable: {0}")]
    RateLimiter(String),

    #[error("{message}")]
    Network { message: String },
}

impl RemoteFetchError {
    pub fn network(message: impl Into<String>) -> Self {
        RemoteFetchError::Network {
            message: message.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            RemoteFetchError::Timeout { .. } => true,
            RemoteFetchError::Network { .. } => true,
            RemoteFetchError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            RemoteFetchError::RateLimiter(_) => false,
        }
    }
}

// =============================================================================
// STORAGE ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("database busy during {operation}")]
    Busy { operation: &'static str },

    #[error("{operation} failed: {reason}")]
    Query {
        operation: &'static str,
        reason: String,
    },

    #[error("migration to schema v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    #[error("failed to (de)serialize {what}: {reason}")]
    Serialization { what: &'static str, reason: String },
}

impl StorageError {
    pub fn query(operation: &'static str, err: impl std::fmt::Display) -> Self {
        StorageError::Query {
            operation,
            reason: err.to_string(),
        }
    }

    /// Map a rusqlite failure, keeping lock contention distinguishable
    pub fn from_sqlite(operation: &'static str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Busy { operation }
            }
            _ => StorageError::query(operation, err),
        }
    }
}

// =============================================================================
// PARSE ERRORS
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("total count '{value}' is not an integer")]
    InvalidTotalCount { value: String },

    #[error("malformed listing response: {reason}")]
    MalformedResponse { reason: String },

    #[error("listing API returned error {code}: {message}")]
    ApiStatus { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_family_prefix() {
        let err: CoinListError = ParseError::InvalidTotalCount {
            value: "abc".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Parse error: total count 'abc' is not an integer"
        );
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_recoverable_classification() {
        let timeout: CoinListError = RemoteFetchError::Timeout {
            endpoint: "listing".to_string(),
            timeout_ms: 10_000,
        }
        .into();
        assert!(timeout.is_recoverable());

        let not_found: CoinListError = RemoteFetchError::HttpStatus {
            endpoint: "listing".to_string(),
            status: 404,
            body: String::new(),
        }
        .into();
        assert!(!not_found.is_recoverable());

        let throttled = RemoteFetchError::HttpStatus {
            endpoint: "listing".to_string(),
            status: 429,
            body: String::new(),
        };
        assert!(throttled.is_recoverable());

        let busy: CoinListError = StorageError::Busy { operation: "put_page" }.into();
        assert!(busy.is_recoverable());
    }
}
