//! Resumable uploads-playlist crawler
//!
//! Walks a cursor-paginated uploads playlist end-to-end, persisting progress
//! after every page so a crash or quota stop resumes from the last stored
//! continuation token instead of page one. Item insertion is idempotent, so
//! re-fetching a page that was already ingested is a no-op.

use crate::storage::{CrawlProgressRecord, DiscoveredVideo, SqliteStorage, Storage};
use crate::youtube::{ApiResult, YoutubeGateway, LIST_COST};
use std::sync::{Arc, Mutex};

/// Counts from crawling one playlist
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Playlist entries seen across all runs so far
    pub total_seen: i64,
    /// Videos inserted by this run
    pub newly_inserted: u32,
    /// Whether the playlist has been walked to the end
    pub completed: bool,
}

/// Walks uploads playlists through the gateway
pub struct UploadsCrawler<'a> {
    gateway: &'a YoutubeGateway,
    storage: Arc<Mutex<SqliteStorage>>,
    /// Page cap per playlist per run; 0 means unlimited
    max_pages_per_run: u32,
}

impl<'a> UploadsCrawler<'a> {
    pub fn new(
        gateway: &'a YoutubeGateway,
        storage: Arc<Mutex<SqliteStorage>>,
        max_pages_per_run: u32,
    ) -> Self {
        Self {
            gateway,
            storage,
            max_pages_per_run,
        }
    }

    /// Crawls one uploads playlist, resuming from persisted progress
    ///
    /// Quota exhaustion ends the walk cleanly with everything fetched so far
    /// already durable; any other upstream error propagates without touching
    /// the progress row for the failed page.
    pub async fn crawl_uploads(
        &self,
        playlist_id: &str,
        channel_id: &str,
        source_label: &str,
    ) -> ApiResult<CrawlOutcome> {
        let mut progress = {
            let storage = self.storage.lock().unwrap();
            storage
                .get_crawl_progress(playlist_id)?
                .unwrap_or_else(|| CrawlProgressRecord::fresh(playlist_id, channel_id))
        };

        if progress.completed {
            tracing::debug!("Playlist {} already fully crawled", playlist_id);
            return Ok(CrawlOutcome {
                total_seen: progress.fetched_count,
                newly_inserted: 0,
                completed: true,
            });
        }

        let mut newly_inserted: u32 = 0;
        let mut pages_this_run: u32 = 0;

        loop {
            // Both stop conditions are checked before starting the next page,
            // never mid-flight
            if self.max_pages_per_run > 0 && pages_this_run >= self.max_pages_per_run {
                tracing::info!(
                    "Page cap ({}) reached for playlist {}",
                    self.max_pages_per_run,
                    playlist_id
                );
                break;
            }

            if !self.gateway.can_afford(LIST_COST)? {
                tracing::info!(
                    "Quota too low for another page of {}, stopping cleanly",
                    playlist_id
                );
                break;
            }

            let page = match self
                .gateway
                .playlist_page(playlist_id, progress.next_page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if e.is_quota_exhausted() => {
                    tracing::info!("Quota exhausted mid-crawl of {}", playlist_id);
                    break;
                }
                Err(e) => return Err(e),
            };

            // The reported playlist size is recorded the first time any page
            // carries one and never changes afterwards
            if progress.total_results.is_none() {
                if let Some(total) = page.total_results {
                    progress.total_results = Some(total as i64);
                }
            }

            let discovered: Vec<DiscoveredVideo> = page
                .entries
                .iter()
                .filter(|entry| !entry.video_id.is_empty())
                .map(|entry| DiscoveredVideo {
                    video_id: entry.video_id.clone(),
                    title: entry.title.clone(),
                    published_at: entry.published_at.clone(),
                })
                .collect();

            progress.fetched_count += page.entries.len() as i64;
            progress.next_page_token = page.next_page_token;
            progress.completed = progress.next_page_token.is_none();

            // One transaction inserts the page's items, the immediately
            // following one advances the cursor; a crash in between is safe
            // because the re-fetched page inserts as a no-op
            {
                let mut storage = self.storage.lock().unwrap();
                newly_inserted +=
                    storage.insert_videos_if_absent(channel_id, source_label, &discovered)? as u32;
                storage.upsert_crawl_progress(&progress)?;
            }

            pages_this_run += 1;
            tracing::debug!(
                "Playlist {}: page {} this run, {} entries, {} seen in total",
                playlist_id,
                pages_this_run,
                page.entries.len(),
                progress.fetched_count
            );

            if progress.completed {
                tracing::info!(
                    "Playlist {} fully crawled ({} entries)",
                    playlist_id,
                    progress.fetched_count
                );
                break;
            }
        }

        Ok(CrawlOutcome {
            total_seen: progress.fetched_count,
            newly_inserted,
            completed: progress.completed,
        })
    }
}
