//! Error kinds that actually cross a component boundary.
//!
//! `UpstreamMalformed` and `CacheIO` are deliberately absent: per the
//! propagation policy, both are always recovered inside the component that
//! owns them (degrade to a fallback, or treat a cache read failure as a
//! miss) and logged there. Only caller-visible validation failures and
//! exhausted upstream retries ever reach a caller of this crate.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Fetcher-specific failure kind, matching the spec's `FetchError{kind}`
/// shape. Transient failures are only raised after retries are exhausted;
/// an empty result set is never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transient upstream failure: {0}")]
    Transient(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<FetchError> for CoreError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Transient(msg) => CoreError::UpstreamUnavailable(msg),
            FetchError::InvalidQuery(msg) => CoreError::InvalidRequest(msg),
            FetchError::NotFound(msg) => CoreError::UpstreamUnavailable(msg),
        }
    }
}
