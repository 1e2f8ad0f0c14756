//! Normalized result types returned by the gateway
//!
//! Callers only ever see these shapes; the raw upstream JSON stays behind
//! the parsing step in [`crate::youtube::parse`].

use crate::storage::{Availability, ChannelRecord};

/// A channel candidate returned by a text search
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub channel_id: String,
    pub title: String,
    pub description: String,
}

/// Full channel details from a direct lookup
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub handle: Option<String>,
    pub uploads_playlist_id: Option<String>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub view_count: Option<u64>,
    pub verified: bool,
    /// False for placeholders synthesized when a batched lookup omitted the ID
    pub available: bool,
}

impl ChannelInfo {
    /// Placeholder for a channel the upstream listing omitted from a batch
    pub fn missing(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            title: String::new(),
            description: String::new(),
            handle: None,
            uploads_playlist_id: None,
            subscriber_count: None,
            video_count: None,
            view_count: None,
            verified: false,
            available: false,
        }
    }

    /// Converts to the storage record shape
    pub fn to_record(&self) -> ChannelRecord {
        ChannelRecord {
            channel_id: self.channel_id.clone(),
            title: self.title.clone(),
            handle: self.handle.clone(),
            uploads_playlist_id: self.uploads_playlist_id.clone(),
            subscriber_count: self.subscriber_count.map(|c| c as i64),
            video_count: self.video_count.map(|c| c as i64),
            view_count: self.view_count.map(|c| c as i64),
            verified: self.verified,
            updated_at: String::new(),
        }
    }
}

/// One page of an uploads playlist
#[derive(Debug, Clone)]
pub struct PlaylistPage {
    pub entries: Vec<PlaylistEntry>,
    /// Absent exactly when no further pages exist
    pub next_page_token: Option<String>,
    /// Reported size of the whole playlist, when the page carries one
    pub total_results: Option<u32>,
}

/// A single playlist item
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    /// May be empty for defective upstream rows; such entries are filtered
    /// out before persistence
    pub video_id: String,
    pub title: String,
    pub published_at: Option<String>,
}

/// Full video details from a batched lookup
#[derive(Debug, Clone)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<String>,
    pub duration_raw: Option<String>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub tags: Vec<String>,
    pub availability: Availability,
}

impl VideoDetails {
    /// Placeholder for a video the upstream listing omitted from a batch,
    /// flagged as deleted so callers never special-case missing rows
    pub fn missing(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: String::new(),
            published_at: None,
            duration_raw: None,
            duration_seconds: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            tags: Vec::new(),
            availability: Availability::Deleted,
        }
    }
}
