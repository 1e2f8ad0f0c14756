//! Video metadata fetch and classification
//!
//! Drains pending videos in batches through the gateway's batched lookup,
//! writing back duration, engagement counts, tags, and availability, plus a
//! simple text classification: short-form detection and a non-music denylist.
//! Each video moves pending -> fetched | failed exactly once.

use crate::storage::{SqliteStorage, Storage, VideoUpdate};
use crate::youtube::{VideoDetails, YoutubeGateway, LIST_COST, MAX_BATCH_IDS};
use std::sync::{Arc, Mutex};

/// Videos at or above this length are never shorts
const SHORT_MAX_SECONDS: u32 = 60;

/// Title marker used by short-form uploads
const SHORTS_MARKER: &str = "#shorts";

/// Title keywords marking a video as something other than music
const NON_MUSIC_KEYWORDS: [&str; 9] = [
    "trailer",
    "interview",
    "podcast",
    "vlog",
    "reaction",
    "review",
    "news",
    "comedy",
    "behind the scenes",
];

/// Counts from one metadata pass
#[derive(Debug, Default)]
pub struct MetadataSummary {
    pub fetched: u32,
    pub failed: u32,
    pub quota_exhausted: bool,
}

/// Fetches details for pending videos in batches
pub struct MetadataFetcher<'a> {
    gateway: &'a YoutubeGateway,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl<'a> MetadataFetcher<'a> {
    pub fn new(gateway: &'a YoutubeGateway, storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { gateway, storage }
    }

    /// Processes pending videos until none remain or quota runs out
    ///
    /// A failed batch marks its members failed and the pass continues with
    /// the next batch; only quota exhaustion stops the stage.
    pub async fn run(&self) -> crate::Result<MetadataSummary> {
        let mut summary = MetadataSummary::default();

        loop {
            let ids = {
                let storage = self.storage.lock().unwrap();
                storage.get_pending_video_ids(MAX_BATCH_IDS)?
            };

            if ids.is_empty() {
                break;
            }

            if !self.gateway.can_afford(LIST_COST)? {
                tracing::info!("Quota too low for another video batch, stopping cleanly");
                summary.quota_exhausted = true;
                break;
            }

            match self.gateway.videos_by_ids(&ids).await {
                Ok(details) => {
                    let mut storage = self.storage.lock().unwrap();
                    for video in &details {
                        storage.mark_video_fetched(&classify(video))?;
                        summary.fetched += 1;
                    }
                }
                Err(e) if e.is_quota_exhausted() => {
                    tracing::info!("Quota exhausted during metadata fetch");
                    summary.quota_exhausted = true;
                    break;
                }
                Err(e) => {
                    tracing::error!("Video batch failed: {}", e);
                    let message = e.to_string();
                    let mut storage = self.storage.lock().unwrap();
                    for id in &ids {
                        storage.mark_video_failed(id, &message)?;
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Builds the write-back update for one video, including classification
fn classify(video: &VideoDetails) -> VideoUpdate {
    let title_lower = video.title.to_lowercase();

    let is_short = video
        .duration_seconds
        .map(|s| s < SHORT_MAX_SECONDS)
        .unwrap_or(false)
        || title_lower.contains(SHORTS_MARKER);

    let non_music_reason = NON_MUSIC_KEYWORDS
        .iter()
        .find(|keyword| title_lower.contains(*keyword))
        .map(|keyword| keyword.to_string());

    VideoUpdate {
        video_id: video.video_id.clone(),
        // Placeholders carry an empty title; never overwrite the discovered
        // one with that
        title: if video.title.is_empty() {
            None
        } else {
            Some(video.title.clone())
        },
        published_at: video.published_at.clone(),
        duration_raw: video.duration_raw.clone(),
        duration_seconds: video.duration_seconds.map(|s| s as i64),
        view_count: video.view_count.map(|c| c as i64),
        like_count: video.like_count.map(|c| c as i64),
        comment_count: video.comment_count.map(|c| c as i64),
        tags: video.tags.clone(),
        availability: video.availability,
        is_short,
        is_music_candidate: non_music_reason.is_none(),
        non_music_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Availability;

    fn details(title: &str, duration_seconds: Option<u32>) -> VideoDetails {
        VideoDetails {
            video_id: "v1".to_string(),
            title: title.to_string(),
            published_at: None,
            duration_raw: None,
            duration_seconds,
            view_count: None,
            like_count: None,
            comment_count: None,
            tags: Vec::new(),
            availability: Availability::Active,
        }
    }

    #[test]
    fn test_short_by_duration() {
        let update = classify(&details("Quick clip", Some(45)));
        assert!(update.is_short);

        let update = classify(&details("Full song", Some(60)));
        assert!(!update.is_short);
    }

    #[test]
    fn test_short_by_title_marker() {
        let update = classify(&details("New riff #Shorts", Some(180)));
        assert!(update.is_short);
    }

    #[test]
    fn test_unknown_duration_is_not_short() {
        let update = classify(&details("Mystery", None));
        assert!(!update.is_short);
    }

    #[test]
    fn test_non_music_denylist() {
        let update = classify(&details("Album Launch INTERVIEW", Some(600)));
        assert!(!update.is_music_candidate);
        assert_eq!(update.non_music_reason.as_deref(), Some("interview"));

        let update = classify(&details("Main Theme (Official Audio)", Some(240)));
        assert!(update.is_music_candidate);
        assert!(update.non_music_reason.is_none());
    }

    #[test]
    fn test_placeholder_title_is_not_written_back() {
        let mut video = details("", None);
        video.availability = Availability::Deleted;
        let update = classify(&video);
        assert!(update.title.is_none());
        assert_eq!(update.availability, Availability::Deleted);
    }
}
