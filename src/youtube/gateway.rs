//! Typed API gateway
//!
//! The single entry point other components use for upstream data. Every
//! call runs the same sequence: compute the request signature, consult the
//! response cache, check the quota ledger, delegate to the transport, cache
//! the raw body, and hand back a normalized typed result.

use crate::config::ApiConfig;
use crate::quota::{request_signature, CostLedger};
use crate::storage::{AuditEntry, SqliteStorage, Storage};
use crate::youtube::parse::{
    parse_channel_list, parse_playlist_page, parse_search_response, parse_video_list,
};
use crate::youtube::transport::Transport;
use crate::youtube::types::{ChannelInfo, PlaylistPage, SearchCandidate, VideoDetails};
use crate::youtube::{ApiError, ApiResult, LIST_COST, MAX_BATCH_IDS, PAGE_SIZE, SEARCH_COST};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Quota-aware, cache-backed gateway to the upstream API
pub struct YoutubeGateway {
    transport: Transport,
    ledger: CostLedger,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl YoutubeGateway {
    pub fn new(
        config: &ApiConfig,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Result<Self, reqwest::Error> {
        let transport = Transport::new(config, Arc::clone(&storage))?;
        let ledger = CostLedger::new(config.daily_quota_budget, config.quota_safety_buffer);

        Ok(Self {
            transport,
            ledger,
            storage,
        })
    }

    /// Units still spendable today
    pub fn remaining_budget(&self) -> ApiResult<u32> {
        let storage = self.storage.lock().unwrap();
        Ok(self.ledger.remaining(&*storage)?)
    }

    /// Whether today's remaining budget covers `cost`
    pub fn can_afford(&self, cost: u32) -> ApiResult<bool> {
        Ok(self.remaining_budget()? >= cost)
    }

    /// Searches for channels matching free text; the expensive operation
    pub async fn search_channels(
        &self,
        query: &str,
        limit: u32,
    ) -> ApiResult<Vec<SearchCandidate>> {
        let params = vec![
            ("part", "snippet".to_string()),
            ("type", "channel".to_string()),
            ("q", query.to_string()),
            ("maxResults", limit.to_string()),
        ];
        let value = self.call("search", SEARCH_COST, params).await?;
        parse_search_response(&value)
    }

    /// Looks up a channel by its handle; `None` when no channel carries it
    pub async fn channel_by_handle(&self, handle: &str) -> ApiResult<Option<ChannelInfo>> {
        let params = vec![
            (
                "part",
                "snippet,contentDetails,statistics,status".to_string(),
            ),
            ("forHandle", handle.to_string()),
        ];
        let value = self.call("channels", LIST_COST, params).await?;
        Ok(parse_channel_list(&value)?.into_iter().next())
    }

    /// Fetches full details for a set of channel IDs
    ///
    /// IDs are deduplicated and split into fixed-size sub-batches. IDs the
    /// upstream omits come back as unavailable placeholders, so callers never
    /// special-case missing rows.
    pub async fn channels_by_ids(&self, ids: &[String]) -> ApiResult<Vec<ChannelInfo>> {
        let mut wanted: Vec<String> = ids.to_vec();
        wanted.sort();
        wanted.dedup();

        let mut channels = Vec::with_capacity(wanted.len());
        for chunk in wanted.chunks(MAX_BATCH_IDS) {
            let params = vec![
                (
                    "part",
                    "snippet,contentDetails,statistics,status".to_string(),
                ),
                ("id", chunk.join(",")),
                ("maxResults", MAX_BATCH_IDS.to_string()),
            ];
            let value = self.call("channels", LIST_COST, params).await?;
            let mut batch = parse_channel_list(&value)?;

            let found: HashSet<String> =
                batch.iter().map(|c| c.channel_id.clone()).collect();
            for id in chunk {
                if !found.contains(id) {
                    batch.push(ChannelInfo::missing(id));
                }
            }
            channels.extend(batch);
        }

        Ok(channels)
    }

    /// Fetches one page of an uploads playlist
    pub async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<PlaylistPage> {
        let mut params = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let value = self.call("playlistItems", LIST_COST, params).await?;
        parse_playlist_page(&value)
    }

    /// Fetches full details for a set of video IDs
    ///
    /// Same batch contract as [`Self::channels_by_ids`]; omitted IDs become
    /// placeholders flagged deleted.
    pub async fn videos_by_ids(&self, ids: &[String]) -> ApiResult<Vec<VideoDetails>> {
        let mut wanted: Vec<String> = ids.to_vec();
        wanted.sort();
        wanted.dedup();

        let mut videos = Vec::with_capacity(wanted.len());
        for chunk in wanted.chunks(MAX_BATCH_IDS) {
            let params = vec![
                (
                    "part",
                    "snippet,contentDetails,statistics,status".to_string(),
                ),
                ("id", chunk.join(",")),
                ("maxResults", MAX_BATCH_IDS.to_string()),
            ];
            let value = self.call("videos", LIST_COST, params).await?;
            let mut batch = parse_video_list(&value)?;

            let found: HashSet<String> = batch.iter().map(|v| v.video_id.clone()).collect();
            for id in chunk {
                if !found.contains(id) {
                    batch.push(VideoDetails::missing(id));
                }
            }
            videos.extend(batch);
        }

        Ok(videos)
    }

    /// Runs the cache -> ledger -> transport sequence for one operation
    async fn call(
        &self,
        operation: &'static str,
        cost: u32,
        params: Vec<(&'static str, String)>,
    ) -> ApiResult<Value> {
        let signature = request_signature(operation, &params);

        let cached = {
            let mut storage = self.storage.lock().unwrap();
            let cached = storage.cache_lookup(&signature)?;
            if cached.is_some() {
                // Replays are audited at zero cost so repeated runs of the
                // same request never re-spend budget
                storage.append_audit(&AuditEntry {
                    operation: operation.to_string(),
                    signature: signature.clone(),
                    cost: 0,
                    cache_hit: true,
                    http_status: Some(200),
                    error: None,
                })?;
            } else {
                let remaining = self.ledger.remaining(&*storage)?;
                if cost > remaining {
                    return Err(ApiError::QuotaExhausted {
                        needed: cost,
                        remaining,
                    });
                }
            }
            cached
        };

        if let Some(body) = cached {
            tracing::debug!("Cache hit for {} ({})", operation, &signature[..12]);
            return parse_json(operation, &body);
        }

        let body = self.transport.send(operation, cost, &signature, &params).await?;

        {
            let mut storage = self.storage.lock().unwrap();
            storage.cache_store(&signature, operation, &body)?;
        }

        parse_json(operation, &body)
    }
}

fn parse_json(operation: &str, body: &str) -> ApiResult<Value> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}
