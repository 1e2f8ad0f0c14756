//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    AuditEntry, ChannelRecord, CrawlProgressRecord, DiscoveredVideo, MetaStatus, OverrideRecord,
    RunStatus, SeedRecord, SeedResolution, SeedStatus, VideoRecord, VideoUpdate,
};
use crate::Availability;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Seed not found: {0}")]
    SeedNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the catalog builder.
/// Every durable mutation is a single serialized write; components hold no
/// long-lived copies of persisted state.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new catalog run, returning its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with the given status and a finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Seeds =====

    /// Inserts seed names that do not already exist; existing rows are left
    /// untouched regardless of their status
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn upsert_seeds(&mut self, names: &[String]) -> StorageResult<usize>;

    /// Gets all seeds still awaiting resolution, in insertion order
    fn get_pending_seeds(&self) -> StorageResult<Vec<SeedRecord>>;

    /// Gets a seed by name
    fn get_seed(&self, name: &str) -> StorageResult<Option<SeedRecord>>;

    /// Records a successful resolution for a seed
    fn mark_seed_resolved(&mut self, name: &str, resolution: &SeedResolution) -> StorageResult<()>;

    /// Records a failed resolution for a seed with a descriptive reason
    fn mark_seed_failed(&mut self, name: &str, error: &str) -> StorageResult<()>;

    /// Flips failed seeds back to pending so a later run retries them
    ///
    /// # Returns
    ///
    /// The number of seeds reset
    fn reset_failed_seeds(&mut self) -> StorageResult<usize>;

    // ===== Channels =====

    /// Inserts or updates a channel; all mutable fields are last-write-wins
    fn upsert_channel(&mut self, channel: &ChannelRecord) -> StorageResult<()>;

    /// Gets a channel by its canonical ID
    fn get_channel(&self, channel_id: &str) -> StorageResult<Option<ChannelRecord>>;

    /// Gets all channels whose uploads playlist is known
    fn get_channels_with_uploads(&self) -> StorageResult<Vec<ChannelRecord>>;

    // ===== Videos =====

    /// Inserts discovered videos that do not already exist, in `pending`
    /// metadata state; existing rows (including `fetched` ones) are never
    /// touched
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_videos_if_absent(
        &mut self,
        channel_id: &str,
        source_label: &str,
        videos: &[DiscoveredVideo],
    ) -> StorageResult<usize>;

    /// Gets a video by its canonical ID
    fn get_video(&self, video_id: &str) -> StorageResult<Option<VideoRecord>>;

    /// Gets IDs of videos still awaiting a detail fetch, in ID order
    fn get_pending_video_ids(&self, limit: usize) -> StorageResult<Vec<String>>;

    /// Writes detail fields back and moves the video to `fetched`
    fn mark_video_fetched(&mut self, update: &VideoUpdate) -> StorageResult<()>;

    /// Marks a video's detail fetch as failed with a reason
    fn mark_video_failed(&mut self, video_id: &str, error: &str) -> StorageResult<()>;

    // ===== Crawl Progress =====

    /// Gets crawl progress for an uploads playlist, if any exists
    fn get_crawl_progress(&self, playlist_id: &str)
        -> StorageResult<Option<CrawlProgressRecord>>;

    /// Inserts or replaces crawl progress; called once per fetched page
    fn upsert_crawl_progress(&mut self, progress: &CrawlProgressRecord) -> StorageResult<()>;

    // ===== Audit Log & Cache =====

    /// Appends a call-audit entry; rows are immutable after insert
    fn append_audit(&mut self, entry: &AuditEntry) -> StorageResult<()>;

    /// Sums the cost of non-cached calls for the given calendar day
    fn sum_cost_for_day(&self, day: &str) -> StorageResult<u32>;

    /// Counts audit rows: (total entries, cache hits)
    fn audit_counts(&self) -> StorageResult<(u64, u64)>;

    /// Looks up a previously cached raw response by request signature
    fn cache_lookup(&self, signature: &str) -> StorageResult<Option<String>>;

    /// Stores a raw successful response under its request signature
    fn cache_store(&mut self, signature: &str, operation: &str, body: &str) -> StorageResult<()>;

    // ===== Overrides =====

    /// Inserts or updates a manual override
    fn upsert_override(&mut self, entry: &OverrideRecord) -> StorageResult<()>;

    /// Gets the override for a seed name, if one exists
    fn get_override(&self, seed_name: &str) -> StorageResult<Option<OverrideRecord>>;

    // ===== Statistics =====

    /// Counts seeds by status
    fn count_seeds_by_status(&self, status: SeedStatus) -> StorageResult<u64>;

    /// Counts all channels
    fn count_channels(&self) -> StorageResult<u64>;

    /// Counts all videos
    fn count_videos(&self) -> StorageResult<u64>;

    /// Counts videos by metadata status
    fn count_videos_by_meta_status(&self, status: MetaStatus) -> StorageResult<u64>;

    /// Counts videos by availability
    fn count_videos_by_availability(&self, availability: Availability) -> StorageResult<u64>;

    /// Counts videos flagged as shorts
    fn count_shorts(&self) -> StorageResult<u64>;

    /// Counts videos still considered music candidates
    fn count_music_candidates(&self) -> StorageResult<u64>;
}
