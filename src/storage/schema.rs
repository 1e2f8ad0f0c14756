//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the catalog database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track catalog runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Seed names awaiting or having completed resolution
CREATE TABLE IF NOT EXISTS seeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'pending',
    channel_id TEXT,
    method TEXT,
    confidence REAL,
    chosen_rank INTEGER,
    error_message TEXT,
    created_at TEXT NOT NULL,
    resolved_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_seeds_status ON seeds(status);

-- Canonical channels, keyed by their immutable upstream ID
CREATE TABLE IF NOT EXISTS channels (
    channel_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    handle TEXT,
    uploads_playlist_id TEXT,
    subscriber_count INTEGER,
    video_count INTEGER,
    view_count INTEGER,
    verified INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Discovered videos, keyed by their immutable upstream ID
CREATE TABLE IF NOT EXISTS videos (
    video_id TEXT PRIMARY KEY,
    channel_id TEXT NOT NULL,
    title TEXT NOT NULL,
    published_at TEXT,
    duration_raw TEXT,
    duration_seconds INTEGER,
    view_count INTEGER,
    like_count INTEGER,
    comment_count INTEGER,
    tags TEXT,
    availability TEXT NOT NULL DEFAULT 'active',
    meta_status TEXT NOT NULL DEFAULT 'pending',
    is_short INTEGER NOT NULL DEFAULT 0,
    is_music_candidate INTEGER NOT NULL DEFAULT 1,
    non_music_reason TEXT,
    source_label TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    fetched_at TEXT,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);
CREATE INDEX IF NOT EXISTS idx_videos_meta_status ON videos(meta_status);

-- One row per uploads playlist being walked
CREATE TABLE IF NOT EXISTS crawl_progress (
    playlist_id TEXT PRIMARY KEY,
    channel_id TEXT NOT NULL,
    total_results INTEGER,
    fetched_count INTEGER NOT NULL DEFAULT 0,
    next_page_token TEXT,
    completed INTEGER NOT NULL DEFAULT 0
);

-- Append-only log of every API call attempt; the daily quota spend is
-- derived by summing non-cached rows for the current day
CREATE TABLE IF NOT EXISTS api_audit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL,
    signature TEXT NOT NULL,
    cost INTEGER NOT NULL,
    cache_hit INTEGER NOT NULL DEFAULT 0,
    http_status INTEGER,
    error TEXT,
    day TEXT NOT NULL,
    called_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_api_audit_day_cached ON api_audit(day, cache_hit);

-- Raw successful responses keyed by request signature; no expiry
CREATE TABLE IF NOT EXISTS api_cache (
    signature TEXT PRIMARY KEY,
    operation TEXT NOT NULL,
    response_body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Manual seed-name to channel-ID mappings
CREATE TABLE IF NOT EXISTS overrides (
    seed_name TEXT PRIMARY KEY,
    channel_id TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT ''
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
