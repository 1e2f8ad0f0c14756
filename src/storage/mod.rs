//! Storage module for persisting catalog data
//!
//! This module handles all database operations for the catalog builder,
//! including:
//! - SQLite database initialization and schema management
//! - Seed, channel, and video persistence
//! - Crawl progress tracking and resumption support
//! - The append-only API call audit log and response cache
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError};

use crate::DiggerError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, DiggerError> {
    SqliteStorage::new(path)
}

/// Resolution status of a seed name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedStatus {
    /// Awaiting resolution (also the state a quota-skipped seed stays in)
    Pending,
    /// Resolved to a canonical channel ID
    Resolved,
    /// Resolution attempted and failed this run
    Failed,
    /// Manually excluded from resolution
    Skipped,
}

impl SeedStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "resolved" => Some(Self::Resolved),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Pending, Self::Resolved, Self::Failed, Self::Skipped]
    }
}

/// How a seed was resolved to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionMethod {
    /// Manual override table hit
    Override,
    /// Direct handle lookup
    Handle,
    /// Ranked text search
    Search,
}

impl ResolutionMethod {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Handle => "handle",
            Self::Search => "search",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "override" => Some(Self::Override),
            "handle" => Some(Self::Handle),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// Metadata fetch status of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaStatus {
    /// Discovered by the crawler, details not yet fetched
    Pending,
    /// Details fetched and recorded
    Fetched,
    /// Detail fetch failed this run
    Failed,
}

impl MetaStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Pending, Self::Fetched, Self::Failed]
    }
}

/// Availability of a video on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Publicly watchable
    Active,
    /// Marked private by the uploader
    Private,
    /// Absent from a batched lookup (removed upstream)
    Deleted,
    /// Region-blocked
    Blocked,
}

impl Availability {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Private => "private",
            Self::Deleted => "deleted",
            Self::Blocked => "blocked",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "private" => Some(Self::Private),
            "deleted" => Some(Self::Deleted),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Active, Self::Private, Self::Deleted, Self::Blocked]
    }
}

/// Status of a catalog run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    QuotaExhausted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::QuotaExhausted => "quota_exhausted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "quota_exhausted" => Some(Self::QuotaExhausted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Represents a seed row in the database
#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub id: i64,
    pub name: String,
    pub status: SeedStatus,
    pub channel_id: Option<String>,
    pub method: Option<ResolutionMethod>,
    pub confidence: Option<f64>,
    pub chosen_rank: Option<u32>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

/// The outcome recorded when a seed resolves
#[derive(Debug, Clone)]
pub struct SeedResolution {
    pub channel_id: String,
    pub title: String,
    pub method: ResolutionMethod,
    pub confidence: f64,
    pub chosen_rank: Option<u32>,
}

/// Represents a channel row; mutable fields are last-write-wins,
/// `channel_id` is the stable key
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub title: String,
    pub handle: Option<String>,
    pub uploads_playlist_id: Option<String>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
    pub view_count: Option<i64>,
    pub verified: bool,
    /// Set by storage on upsert; only meaningful on reads
    pub updated_at: String,
}

/// A video discovered on an uploads playlist page, before details are known
#[derive(Debug, Clone)]
pub struct DiscoveredVideo {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<String>,
}

/// Represents a video row in the database
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub published_at: Option<String>,
    pub duration_raw: Option<String>,
    pub duration_seconds: Option<i64>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub tags: Vec<String>,
    pub availability: Availability,
    pub meta_status: MetaStatus,
    pub is_short: bool,
    pub is_music_candidate: bool,
    pub non_music_reason: Option<String>,
    pub source_label: String,
    pub discovered_at: String,
    pub fetched_at: Option<String>,
    pub error_message: Option<String>,
}

/// Detail fields written back by the metadata-fetch stage
#[derive(Debug, Clone)]
pub struct VideoUpdate {
    pub video_id: String,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub duration_raw: Option<String>,
    pub duration_seconds: Option<i64>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub tags: Vec<String>,
    pub availability: Availability,
    pub is_short: bool,
    pub is_music_candidate: bool,
    pub non_music_reason: Option<String>,
}

/// Represents crawl progress for one uploads playlist
#[derive(Debug, Clone)]
pub struct CrawlProgressRecord {
    pub playlist_id: String,
    pub channel_id: String,
    /// Immutable once set; recorded from the first page that reports it
    pub total_results: Option<i64>,
    pub fetched_count: i64,
    pub next_page_token: Option<String>,
    pub completed: bool,
}

impl CrawlProgressRecord {
    /// Fresh progress for a playlist that has never been crawled
    pub fn fresh(playlist_id: &str, channel_id: &str) -> Self {
        Self {
            playlist_id: playlist_id.to_string(),
            channel_id: channel_id.to_string(),
            total_results: None,
            fetched_count: 0,
            next_page_token: None,
            completed: false,
        }
    }
}

/// One API call attempt, cached or real; rows are append-only
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub operation: String,
    pub signature: String,
    pub cost: u32,
    pub cache_hit: bool,
    pub http_status: Option<u16>,
    pub error: Option<String>,
}

/// Manual seed-name to channel-ID mapping
#[derive(Debug, Clone)]
pub struct OverrideRecord {
    pub seed_name: String,
    pub channel_id: String,
    pub notes: String,
}

/// Represents a catalog run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_status_roundtrip() {
        for status in SeedStatus::all_statuses() {
            let db_str = status.to_db_string();
            assert_eq!(Some(status), SeedStatus::from_db_string(db_str));
        }
        assert_eq!(SeedStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_meta_status_roundtrip() {
        for status in MetaStatus::all_statuses() {
            let db_str = status.to_db_string();
            assert_eq!(Some(status), MetaStatus::from_db_string(db_str));
        }
        assert_eq!(MetaStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_availability_roundtrip() {
        for status in Availability::all_statuses() {
            let db_str = status.to_db_string();
            assert_eq!(Some(status), Availability::from_db_string(db_str));
        }
        assert_eq!(Availability::from_db_string("invalid"), None);
    }

    #[test]
    fn test_resolution_method_roundtrip() {
        for method in [
            ResolutionMethod::Override,
            ResolutionMethod::Handle,
            ResolutionMethod::Search,
        ] {
            let db_str = method.to_db_string();
            assert_eq!(Some(method), ResolutionMethod::from_db_string(db_str));
        }
    }

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::QuotaExhausted,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            assert_eq!(Some(*status), RunStatus::from_db_string(db_str));
        }
    }
}
