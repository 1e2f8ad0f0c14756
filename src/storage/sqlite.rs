//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    AuditEntry, ChannelRecord, CrawlProgressRecord, DiscoveredVideo, MetaStatus, OverrideRecord,
    ResolutionMethod, RunStatus, SeedRecord, SeedResolution, SeedStatus, VideoRecord, VideoUpdate,
};
use crate::{Availability, DiggerError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, DiggerError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DiggerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn seed_from_row(row: &Row) -> rusqlite::Result<SeedRecord> {
        Ok(SeedRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            status: SeedStatus::from_db_string(&row.get::<_, String>(2)?)
                .unwrap_or(SeedStatus::Failed),
            channel_id: row.get(3)?,
            method: row
                .get::<_, Option<String>>(4)?
                .as_deref()
                .and_then(ResolutionMethod::from_db_string),
            confidence: row.get(5)?,
            chosen_rank: row.get(6)?,
            error_message: row.get(7)?,
            created_at: row.get(8)?,
            resolved_at: row.get(9)?,
        })
    }

    fn channel_from_row(row: &Row) -> rusqlite::Result<ChannelRecord> {
        Ok(ChannelRecord {
            channel_id: row.get(0)?,
            title: row.get(1)?,
            handle: row.get(2)?,
            uploads_playlist_id: row.get(3)?,
            subscriber_count: row.get(4)?,
            video_count: row.get(5)?,
            view_count: row.get(6)?,
            verified: row.get::<_, i64>(7)? != 0,
            updated_at: row.get(8)?,
        })
    }

    fn video_from_row(row: &Row) -> rusqlite::Result<VideoRecord> {
        let tags_json: Option<String> = row.get(9)?;
        let tags = tags_json
            .as_deref()
            .and_then(|t| serde_json::from_str(t).ok())
            .unwrap_or_default();

        Ok(VideoRecord {
            video_id: row.get(0)?,
            channel_id: row.get(1)?,
            title: row.get(2)?,
            published_at: row.get(3)?,
            duration_raw: row.get(4)?,
            duration_seconds: row.get(5)?,
            view_count: row.get(6)?,
            like_count: row.get(7)?,
            comment_count: row.get(8)?,
            tags,
            availability: Availability::from_db_string(&row.get::<_, String>(10)?)
                .unwrap_or(Availability::Active),
            meta_status: MetaStatus::from_db_string(&row.get::<_, String>(11)?)
                .unwrap_or(MetaStatus::Pending),
            is_short: row.get::<_, i64>(12)? != 0,
            is_music_candidate: row.get::<_, i64>(13)? != 0,
            non_music_reason: row.get(14)?,
            source_label: row.get(15)?,
            discovered_at: row.get(16)?,
            fetched_at: row.get(17)?,
            error_message: row.get(18)?,
        })
    }
}

const SEED_COLUMNS: &str = "id, name, status, channel_id, method, confidence, chosen_rank,
     error_message, created_at, resolved_at";

const VIDEO_COLUMNS: &str = "video_id, channel_id, title, published_at, duration_raw,
     duration_seconds, view_count, like_count, comment_count, tags, availability, meta_status,
     is_short, is_music_candidate, non_music_reason, source_label, discovered_at, fetched_at,
     error_message";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Seeds =====

    fn upsert_seeds(&mut self, names: &[String]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for name in names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO seeds (name, status, created_at) VALUES (?1, ?2, ?3)",
                params![trimmed, SeedStatus::Pending.to_db_string(), now],
            )?;
        }
        Ok(inserted)
    }

    fn get_pending_seeds(&self) -> StorageResult<Vec<SeedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM seeds WHERE status = ?1 ORDER BY id",
            SEED_COLUMNS
        ))?;

        let seeds = stmt
            .query_map(params![SeedStatus::Pending.to_db_string()], |row| {
                Self::seed_from_row(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(seeds)
    }

    fn get_seed(&self, name: &str) -> StorageResult<Option<SeedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM seeds WHERE name = ?1",
            SEED_COLUMNS
        ))?;

        let seed = stmt
            .query_row(params![name], |row| Self::seed_from_row(row))
            .optional()?;

        Ok(seed)
    }

    fn mark_seed_resolved(&mut self, name: &str, resolution: &SeedResolution) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE seeds SET status = ?1, channel_id = ?2, method = ?3, confidence = ?4,
             chosen_rank = ?5, error_message = NULL, resolved_at = ?6 WHERE name = ?7",
            params![
                SeedStatus::Resolved.to_db_string(),
                resolution.channel_id,
                resolution.method.to_db_string(),
                resolution.confidence,
                resolution.chosen_rank,
                now,
                name
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::SeedNotFound(name.to_string()));
        }

        Ok(())
    }

    fn mark_seed_failed(&mut self, name: &str, error: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE seeds SET status = ?1, error_message = ?2, resolved_at = ?3 WHERE name = ?4",
            params![SeedStatus::Failed.to_db_string(), error, now, name],
        )?;

        if updated == 0 {
            return Err(StorageError::SeedNotFound(name.to_string()));
        }

        Ok(())
    }

    fn reset_failed_seeds(&mut self) -> StorageResult<usize> {
        let reset = self.conn.execute(
            "UPDATE seeds SET status = ?1, error_message = NULL, resolved_at = NULL
             WHERE status = ?2",
            params![
                SeedStatus::Pending.to_db_string(),
                SeedStatus::Failed.to_db_string()
            ],
        )?;
        Ok(reset)
    }

    // ===== Channels =====

    fn upsert_channel(&mut self, channel: &ChannelRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO channels
             (channel_id, title, handle, uploads_playlist_id, subscriber_count, video_count,
              view_count, verified, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                channel.channel_id,
                channel.title,
                channel.handle,
                channel.uploads_playlist_id,
                channel.subscriber_count,
                channel.video_count,
                channel.view_count,
                channel.verified as i64,
                now,
            ],
        )?;
        Ok(())
    }

    fn get_channel(&self, channel_id: &str) -> StorageResult<Option<ChannelRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT channel_id, title, handle, uploads_playlist_id, subscriber_count,
             video_count, view_count, verified, updated_at FROM channels WHERE channel_id = ?1",
        )?;

        let channel = stmt
            .query_row(params![channel_id], |row| Self::channel_from_row(row))
            .optional()?;

        Ok(channel)
    }

    fn get_channels_with_uploads(&self) -> StorageResult<Vec<ChannelRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT channel_id, title, handle, uploads_playlist_id, subscriber_count,
             video_count, view_count, verified, updated_at FROM channels
             WHERE uploads_playlist_id IS NOT NULL ORDER BY channel_id",
        )?;

        let channels = stmt
            .query_map([], |row| Self::channel_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(channels)
    }

    // ===== Videos =====

    fn insert_videos_if_absent(
        &mut self,
        channel_id: &str,
        source_label: &str,
        videos: &[DiscoveredVideo],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for video in videos {
            // Rows with an empty natural key never reach the database
            if video.video_id.is_empty() {
                continue;
            }
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO videos
                 (video_id, channel_id, title, published_at, meta_status, source_label,
                  discovered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    video.video_id,
                    channel_id,
                    video.title,
                    video.published_at,
                    MetaStatus::Pending.to_db_string(),
                    source_label,
                    now,
                ],
            )?;
        }
        Ok(inserted)
    }

    fn get_video(&self, video_id: &str) -> StorageResult<Option<VideoRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM videos WHERE video_id = ?1",
            VIDEO_COLUMNS
        ))?;

        let video = stmt
            .query_row(params![video_id], |row| Self::video_from_row(row))
            .optional()?;

        Ok(video)
    }

    fn get_pending_video_ids(&self, limit: usize) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT video_id FROM videos WHERE meta_status = ?1 ORDER BY video_id LIMIT ?2",
        )?;

        let ids = stmt
            .query_map(
                params![MetaStatus::Pending.to_db_string(), limit as i64],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn mark_video_fetched(&mut self, update: &VideoUpdate) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&update.tags)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn.execute(
            "UPDATE videos SET
                 title = COALESCE(?1, title),
                 published_at = COALESCE(?2, published_at),
                 duration_raw = ?3,
                 duration_seconds = ?4,
                 view_count = ?5,
                 like_count = ?6,
                 comment_count = ?7,
                 tags = ?8,
                 availability = ?9,
                 meta_status = ?10,
                 is_short = ?11,
                 is_music_candidate = ?12,
                 non_music_reason = ?13,
                 fetched_at = ?14,
                 error_message = NULL
             WHERE video_id = ?15",
            params![
                update.title,
                update.published_at,
                update.duration_raw,
                update.duration_seconds,
                update.view_count,
                update.like_count,
                update.comment_count,
                tags_json,
                update.availability.to_db_string(),
                MetaStatus::Fetched.to_db_string(),
                update.is_short as i64,
                update.is_music_candidate as i64,
                update.non_music_reason,
                now,
                update.video_id,
            ],
        )?;
        Ok(())
    }

    fn mark_video_failed(&mut self, video_id: &str, error: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE videos SET meta_status = ?1, error_message = ?2 WHERE video_id = ?3",
            params![MetaStatus::Failed.to_db_string(), error, video_id],
        )?;
        Ok(())
    }

    // ===== Crawl Progress =====

    fn get_crawl_progress(
        &self,
        playlist_id: &str,
    ) -> StorageResult<Option<CrawlProgressRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist_id, channel_id, total_results, fetched_count, next_page_token,
             completed FROM crawl_progress WHERE playlist_id = ?1",
        )?;

        let progress = stmt
            .query_row(params![playlist_id], |row| {
                Ok(CrawlProgressRecord {
                    playlist_id: row.get(0)?,
                    channel_id: row.get(1)?,
                    total_results: row.get(2)?,
                    fetched_count: row.get(3)?,
                    next_page_token: row.get(4)?,
                    completed: row.get::<_, i64>(5)? != 0,
                })
            })
            .optional()?;

        Ok(progress)
    }

    fn upsert_crawl_progress(&mut self, progress: &CrawlProgressRecord) -> StorageResult<()> {
        // A completed playlist never carries a continuation token
        let token = if progress.completed {
            None
        } else {
            progress.next_page_token.clone()
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO crawl_progress
             (playlist_id, channel_id, total_results, fetched_count, next_page_token, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                progress.playlist_id,
                progress.channel_id,
                progress.total_results,
                progress.fetched_count,
                token,
                progress.completed as i64,
            ],
        )?;
        Ok(())
    }

    // ===== Audit Log & Cache =====

    fn append_audit(&mut self, entry: &AuditEntry) -> StorageResult<()> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO api_audit
             (operation, signature, cost, cache_hit, http_status, error, day, called_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.operation,
                entry.signature,
                entry.cost,
                entry.cache_hit as i64,
                entry.http_status,
                entry.error,
                now.format("%Y-%m-%d").to_string(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn sum_cost_for_day(&self, day: &str) -> StorageResult<u32> {
        let sum: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(cost), 0) FROM api_audit WHERE day = ?1 AND cache_hit = 0",
            params![day],
            |row| row.get(0),
        )?;
        Ok(sum as u32)
    }

    fn audit_counts(&self) -> StorageResult<(u64, u64)> {
        let (total, hits): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(cache_hit), 0) FROM api_audit",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total as u64, hits as u64))
    }

    fn cache_lookup(&self, signature: &str) -> StorageResult<Option<String>> {
        let body = self
            .conn
            .query_row(
                "SELECT response_body FROM api_cache WHERE signature = ?1",
                params![signature],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    fn cache_store(&mut self, signature: &str, operation: &str, body: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO api_cache (signature, operation, response_body, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![signature, operation, body, now],
        )?;
        Ok(())
    }

    // ===== Overrides =====

    fn upsert_override(&mut self, entry: &OverrideRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO overrides (seed_name, channel_id, notes) VALUES (?1, ?2, ?3)",
            params![entry.seed_name, entry.channel_id, entry.notes],
        )?;
        Ok(())
    }

    fn get_override(&self, seed_name: &str) -> StorageResult<Option<OverrideRecord>> {
        let entry = self
            .conn
            .query_row(
                "SELECT seed_name, channel_id, notes FROM overrides WHERE seed_name = ?1",
                params![seed_name],
                |row| {
                    Ok(OverrideRecord {
                        seed_name: row.get(0)?,
                        channel_id: row.get(1)?,
                        notes: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    // ===== Statistics =====

    fn count_seeds_by_status(&self, status: SeedStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM seeds WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_channels(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM channels", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_videos(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_videos_by_meta_status(&self, status: MetaStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE meta_status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_videos_by_availability(&self, availability: Availability) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE availability = ?1",
            params![availability.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_shorts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos WHERE is_short = 1", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    fn count_music_candidates(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE is_music_candidate = 1 AND meta_status = ?1",
            params![MetaStatus::Fetched.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(id: &str, title: &str) -> DiscoveredVideo {
        DiscoveredVideo {
            video_id: id.to_string(),
            title: title.to_string(),
            published_at: Some("2024-01-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_seed_insert_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let names = vec!["A.R. Rahman".to_string()];

        let first = storage.upsert_seeds(&names).unwrap();
        let second = storage.upsert_seeds(&names).unwrap();
        let third = storage.upsert_seeds(&names).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(third, 0);

        let pending = storage.get_pending_seeds().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, SeedStatus::Pending);
    }

    #[test]
    fn test_upsert_seeds_skips_blank_names() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let names = vec!["  ".to_string(), "Real Artist".to_string()];

        let inserted = storage.upsert_seeds(&names).unwrap();
        assert_eq!(inserted, 1);
    }

    #[test]
    fn test_seed_resolution_transition() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_seeds(&["Artist".to_string()]).unwrap();

        storage
            .mark_seed_resolved(
                "Artist",
                &SeedResolution {
                    channel_id: "UC123".to_string(),
                    title: "Artist Official".to_string(),
                    method: ResolutionMethod::Search,
                    confidence: 0.65,
                    chosen_rank: Some(1),
                },
            )
            .unwrap();

        let seed = storage.get_seed("Artist").unwrap().unwrap();
        assert_eq!(seed.status, SeedStatus::Resolved);
        assert_eq!(seed.channel_id.as_deref(), Some("UC123"));
        assert_eq!(seed.method, Some(ResolutionMethod::Search));
        assert_eq!(seed.chosen_rank, Some(1));

        // Resolved seeds no longer appear in the pending set
        assert!(storage.get_pending_seeds().unwrap().is_empty());
    }

    #[test]
    fn test_mark_unknown_seed_fails() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.mark_seed_failed("missing", "whatever");
        assert!(matches!(result, Err(StorageError::SeedNotFound(_))));
    }

    #[test]
    fn test_reset_failed_seeds() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_seeds(&["One".to_string(), "Two".to_string()])
            .unwrap();
        storage.mark_seed_failed("One", "No search results").unwrap();

        let reset = storage.reset_failed_seeds().unwrap();
        assert_eq!(reset, 1);

        let seed = storage.get_seed("One").unwrap().unwrap();
        assert_eq!(seed.status, SeedStatus::Pending);
        assert!(seed.error_message.is_none());
    }

    #[test]
    fn test_channel_upsert_last_write_wins() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let mut channel = ChannelRecord {
            channel_id: "UC123".to_string(),
            title: "Old Title".to_string(),
            handle: None,
            uploads_playlist_id: Some("UU123".to_string()),
            subscriber_count: Some(1000),
            video_count: Some(10),
            view_count: Some(100_000),
            verified: false,
            updated_at: String::new(),
        };
        storage.upsert_channel(&channel).unwrap();

        channel.title = "New Title".to_string();
        channel.subscriber_count = Some(2000);
        storage.upsert_channel(&channel).unwrap();

        let loaded = storage.get_channel("UC123").unwrap().unwrap();
        assert_eq!(loaded.title, "New Title");
        assert_eq!(loaded.subscriber_count, Some(2000));
        assert_eq!(storage.count_channels().unwrap(), 1);
    }

    #[test]
    fn test_video_insert_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let videos = vec![discovered("v1", "Song"), discovered("v2", "Another Song")];

        let first = storage
            .insert_videos_if_absent("UC123", "Artist", &videos)
            .unwrap();
        let second = storage
            .insert_videos_if_absent("UC123", "Artist", &videos)
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert_eq!(storage.count_videos().unwrap(), 2);
    }

    #[test]
    fn test_video_insert_filters_empty_ids() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let videos = vec![discovered("", "Ghost"), discovered("v1", "Song")];

        let inserted = storage
            .insert_videos_if_absent("UC123", "Artist", &videos)
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[test]
    fn test_fetched_video_never_reverts_to_pending() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_videos_if_absent("UC123", "Artist", &[discovered("v1", "Song")])
            .unwrap();

        storage
            .mark_video_fetched(&VideoUpdate {
                video_id: "v1".to_string(),
                title: Some("Song (Official Video)".to_string()),
                published_at: None,
                duration_raw: Some("PT3M30S".to_string()),
                duration_seconds: Some(210),
                view_count: Some(5000),
                like_count: Some(100),
                comment_count: Some(10),
                tags: vec!["music".to_string()],
                availability: Availability::Active,
                is_short: false,
                is_music_candidate: true,
                non_music_reason: None,
            })
            .unwrap();

        // Re-discovering the same video on a later crawl is a no-op
        let inserted = storage
            .insert_videos_if_absent("UC123", "Artist", &[discovered("v1", "Song")])
            .unwrap();
        assert_eq!(inserted, 0);

        let video = storage.get_video("v1").unwrap().unwrap();
        assert_eq!(video.meta_status, MetaStatus::Fetched);
        assert_eq!(video.title, "Song (Official Video)");
        assert_eq!(video.duration_seconds, Some(210));
        assert_eq!(video.tags, vec!["music".to_string()]);
    }

    #[test]
    fn test_pending_video_ids_respect_limit() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let videos: Vec<DiscoveredVideo> = (0..5)
            .map(|i| discovered(&format!("v{}", i), "Song"))
            .collect();
        storage
            .insert_videos_if_absent("UC123", "Artist", &videos)
            .unwrap();

        let ids = storage.get_pending_video_ids(3).unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_crawl_progress_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        assert!(storage.get_crawl_progress("UU123").unwrap().is_none());

        let mut progress = CrawlProgressRecord::fresh("UU123", "UC123");
        progress.total_results = Some(120);
        progress.fetched_count = 50;
        progress.next_page_token = Some("tok2".to_string());
        storage.upsert_crawl_progress(&progress).unwrap();

        let loaded = storage.get_crawl_progress("UU123").unwrap().unwrap();
        assert_eq!(loaded.total_results, Some(120));
        assert_eq!(loaded.fetched_count, 50);
        assert_eq!(loaded.next_page_token.as_deref(), Some("tok2"));
        assert!(!loaded.completed);
    }

    #[test]
    fn test_completed_progress_clears_token() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let mut progress = CrawlProgressRecord::fresh("UU123", "UC123");
        progress.next_page_token = Some("stale".to_string());
        progress.completed = true;
        storage.upsert_crawl_progress(&progress).unwrap();

        let loaded = storage.get_crawl_progress("UU123").unwrap().unwrap();
        assert!(loaded.completed);
        assert!(loaded.next_page_token.is_none());
    }

    #[test]
    fn test_audit_sum_excludes_cache_hits() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        storage
            .append_audit(&AuditEntry {
                operation: "search".to_string(),
                signature: "sig1".to_string(),
                cost: 100,
                cache_hit: false,
                http_status: Some(200),
                error: None,
            })
            .unwrap();
        storage
            .append_audit(&AuditEntry {
                operation: "search".to_string(),
                signature: "sig1".to_string(),
                cost: 0,
                cache_hit: true,
                http_status: Some(200),
                error: None,
            })
            .unwrap();
        storage
            .append_audit(&AuditEntry {
                operation: "playlistItems".to_string(),
                signature: "sig2".to_string(),
                cost: 1,
                cache_hit: false,
                http_status: Some(500),
                error: Some("server error".to_string()),
            })
            .unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(storage.sum_cost_for_day(&today).unwrap(), 101);
        assert_eq!(storage.sum_cost_for_day("1970-01-01").unwrap(), 0);
        assert_eq!(storage.audit_counts().unwrap(), (3, 1));
    }

    #[test]
    fn test_cache_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        assert!(storage.cache_lookup("sig1").unwrap().is_none());

        storage
            .cache_store("sig1", "search", r#"{"items":[]}"#)
            .unwrap();
        let body = storage.cache_lookup("sig1").unwrap().unwrap();
        assert_eq!(body, r#"{"items":[]}"#);
    }

    #[test]
    fn test_override_upsert_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let entry = OverrideRecord {
            seed_name: "Artist".to_string(),
            channel_id: "UC123".to_string(),
            notes: "verified by hand".to_string(),
        };
        storage.upsert_override(&entry).unwrap();
        storage.upsert_override(&entry).unwrap();

        let loaded = storage.get_override("Artist").unwrap().unwrap();
        assert_eq!(loaded.channel_id, "UC123");
        assert_eq!(loaded.notes, "verified by hand");
    }

    #[test]
    fn test_run_lifecycle() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        assert!(run_id > 0);
        storage.finish_run(run_id, RunStatus::Completed).unwrap();
    }
}
