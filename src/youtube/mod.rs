//! YouTube Data API access layer
//!
//! This module handles all upstream communication for the catalog builder:
//! - A rate-limited, retrying transport, the only component doing network I/O
//! - A typed gateway that fronts the transport with the response cache and
//!   the daily quota ledger
//! - Parsing of raw JSON payloads into normalized result types at the
//!   boundary, so upstream shapes never leak further in

mod gateway;
mod parse;
mod transport;
mod types;

pub use gateway::YoutubeGateway;
pub use parse::duration_to_seconds;
pub use transport::{RetryPolicy, Transport};
pub use types::{ChannelInfo, PlaylistEntry, PlaylistPage, SearchCandidate, VideoDetails};

use crate::storage::StorageError;
use thiserror::Error;

/// Quota cost of a text search call
pub const SEARCH_COST: u32 = 100;

/// Quota cost of list-style calls (channels, playlist pages, videos)
pub const LIST_COST: u32 = 1;

/// Maximum IDs accepted by a single batched lookup
pub const MAX_BATCH_IDS: usize = 50;

/// Items requested per playlist page
pub const PAGE_SIZE: u32 = 50;

/// Errors surfaced by the API access layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network fault, 5xx, or an explicit rate-limit signal; retried by the
    /// transport before it ever surfaces
    #[error("Transient failure in {operation}: {message}")]
    Transient { operation: String, message: String },

    /// Malformed request or bad ID; never retried
    #[error("Request rejected in {operation}: {message}")]
    Fatal { operation: String, message: String },

    /// Expected control-flow signal: the current stage stops cleanly and a
    /// later run picks up where it left off
    #[error("Daily quota exhausted: {needed} units needed, {remaining} remaining")]
    QuotaExhausted { needed: u32, remaining: u32 },

    /// Response body did not match the expected shape
    #[error("Malformed {operation} response: {message}")]
    Parse { operation: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Whether this error means the daily budget ran out
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::QuotaExhausted { .. })
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
