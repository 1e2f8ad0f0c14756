//! Resolution engine
//!
//! Works through pending seeds one at a time, first looking for a manual
//! override, then trying a direct handle lookup for handle-shaped names,
//! and finally falling back to a ranked text search. Each seed transitions
//! pending -> resolved | failed exactly once per run; a seed skipped for
//! lack of quota stays pending for the next run.

use crate::resolve::scoring::{score_candidate, ScoreInputs, HANDLE_MIN_SCORE, SEARCH_MIN_SCORE};
use crate::storage::{ResolutionMethod, SeedResolution, SqliteStorage, Storage};
use crate::youtube::{ApiResult, YoutubeGateway, SEARCH_COST};
use std::sync::{Arc, Mutex};

/// A successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedSeed {
    pub channel_id: String,
    pub title: String,
    pub confidence: f64,
    pub method: ResolutionMethod,
    /// 1-based search rank of the winner; absent for override and handle hits
    pub rank: Option<u32>,
}

/// Outcome of resolving one seed
#[derive(Debug)]
pub enum Resolution {
    /// Seed resolved to a channel
    Resolved(ResolvedSeed),
    /// No candidate was confident enough; recorded as failed with the reason
    NoMatch(String),
    /// Not enough quota to attempt resolution; the seed stays pending
    Skipped(String),
}

/// Counts from one resolution pass
#[derive(Debug, Default)]
pub struct ResolutionSummary {
    pub resolved: u32,
    pub failed: u32,
    pub skipped: u32,
    pub quota_exhausted: bool,
}

/// Resolves pending seeds through the gateway
pub struct Resolver<'a> {
    gateway: &'a YoutubeGateway,
    storage: Arc<Mutex<SqliteStorage>>,
    max_search_results: u32,
}

impl<'a> Resolver<'a> {
    pub fn new(
        gateway: &'a YoutubeGateway,
        storage: Arc<Mutex<SqliteStorage>>,
        max_search_results: u32,
    ) -> Self {
        Self {
            gateway,
            storage,
            max_search_results,
        }
    }

    /// Resolves every pending seed, recording each outcome as it lands
    ///
    /// Quota exhaustion stops the pass; any other per-seed error marks that
    /// seed failed and the pass continues.
    pub async fn run(&self) -> crate::Result<ResolutionSummary> {
        let pending = {
            let storage = self.storage.lock().unwrap();
            storage.get_pending_seeds()?
        };

        let mut summary = ResolutionSummary::default();

        for seed in pending {
            match self.resolve_seed(&seed.name).await {
                Ok(Resolution::Resolved(resolved)) => {
                    tracing::info!(
                        "Resolved '{}' -> {} ({}, score {:.3})",
                        seed.name,
                        resolved.channel_id,
                        resolved.method.to_db_string(),
                        resolved.confidence
                    );
                    let mut storage = self.storage.lock().unwrap();
                    storage.mark_seed_resolved(
                        &seed.name,
                        &SeedResolution {
                            channel_id: resolved.channel_id.clone(),
                            title: resolved.title.clone(),
                            method: resolved.method,
                            confidence: resolved.confidence,
                            chosen_rank: resolved.rank,
                        },
                    )?;
                    summary.resolved += 1;
                }
                Ok(Resolution::NoMatch(reason)) => {
                    tracing::warn!("Could not resolve '{}': {}", seed.name, reason);
                    let mut storage = self.storage.lock().unwrap();
                    storage.mark_seed_failed(&seed.name, &reason)?;
                    summary.failed += 1;
                }
                Ok(Resolution::Skipped(reason)) => {
                    tracing::info!("Skipping '{}' this run: {}", seed.name, reason);
                    summary.skipped += 1;
                }
                Err(e) if e.is_quota_exhausted() => {
                    tracing::info!("Quota exhausted, stopping resolution: {}", e);
                    summary.quota_exhausted = true;
                    break;
                }
                Err(e) => {
                    tracing::error!("Error resolving '{}': {}", seed.name, e);
                    let mut storage = self.storage.lock().unwrap();
                    storage.mark_seed_failed(&seed.name, &e.to_string())?;
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Resolves a single seed name; first strategy to succeed wins
    pub async fn resolve_seed(&self, name: &str) -> ApiResult<Resolution> {
        if let Some(resolution) = self.try_override(name).await? {
            return Ok(resolution);
        }

        if let Some(resolution) = self.try_handle(name).await? {
            return Ok(resolution);
        }

        self.try_search(name).await
    }

    /// Strategy 1: exact match in the manual override store
    async fn try_override(&self, name: &str) -> ApiResult<Option<Resolution>> {
        let entry = {
            let storage = self.storage.lock().unwrap();
            storage.get_override(name)?
        };

        let Some(entry) = entry else {
            return Ok(None);
        };

        tracing::debug!("Override maps '{}' to {}", name, entry.channel_id);
        let channels = self.gateway.channels_by_ids(&[entry.channel_id.clone()]).await?;
        let channel = channels.into_iter().find(|c| c.available);

        match channel {
            Some(channel) => {
                {
                    let mut storage = self.storage.lock().unwrap();
                    storage.upsert_channel(&channel.to_record())?;
                }
                Ok(Some(Resolution::Resolved(ResolvedSeed {
                    channel_id: channel.channel_id,
                    title: channel.title,
                    confidence: 1.0,
                    method: ResolutionMethod::Override,
                    rank: None,
                })))
            }
            None => Ok(Some(Resolution::NoMatch(format!(
                "Override channel {} not found upstream",
                entry.channel_id
            )))),
        }
    }

    /// Strategy 2: direct handle lookup for handle-shaped names
    async fn try_handle(&self, name: &str) -> ApiResult<Option<Resolution>> {
        let Some(handle) = as_handle(name) else {
            return Ok(None);
        };

        tracing::debug!("Trying handle lookup '{}' for '{}'", handle, name);
        let Some(channel) = self.gateway.channel_by_handle(&handle).await? else {
            return Ok(None);
        };

        let confidence = score_candidate(&ScoreInputs {
            seed: name,
            title: &channel.title,
            description: &channel.description,
            popularity: channel.subscriber_count,
            rank: 1,
        });

        if confidence < HANDLE_MIN_SCORE {
            tracing::debug!(
                "Handle hit '{}' scored {:.3}, below {}; falling through to search",
                channel.title,
                confidence,
                HANDLE_MIN_SCORE
            );
            return Ok(None);
        }

        {
            let mut storage = self.storage.lock().unwrap();
            storage.upsert_channel(&channel.to_record())?;
        }

        Ok(Some(Resolution::Resolved(ResolvedSeed {
            channel_id: channel.channel_id,
            title: channel.title,
            confidence,
            method: ResolutionMethod::Handle,
            rank: None,
        })))
    }

    /// Strategy 3: ranked text search
    async fn try_search(&self, name: &str) -> ApiResult<Resolution> {
        // Search is the expensive operation; skip rather than fail when the
        // remaining budget cannot cover it, leaving the seed pending
        if !self.gateway.can_afford(SEARCH_COST)? {
            return Ok(Resolution::Skipped(format!(
                "remaining quota below search cost ({})",
                SEARCH_COST
            )));
        }

        let candidates = self
            .gateway
            .search_channels(name, self.max_search_results)
            .await?;

        if candidates.is_empty() {
            return Ok(Resolution::NoMatch("No search results".to_string()));
        }

        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (index, candidate) in candidates.iter().enumerate() {
            let score = score_candidate(&ScoreInputs {
                seed: name,
                title: &candidate.title,
                description: &candidate.description,
                popularity: None,
                rank: (index + 1) as u32,
            });
            if score > best_score {
                best_index = index;
                best_score = score;
            }
        }

        if best_score < SEARCH_MIN_SCORE {
            return Ok(Resolution::NoMatch(format!(
                "Best candidate '{}' scored {:.3}, below {}",
                candidates[best_index].title, best_score, SEARCH_MIN_SCORE
            )));
        }

        let winner = &candidates[best_index];
        let rank = (best_index + 1) as u32;

        // Fetch full details for the winner and re-score with subscriber
        // count available
        let channels = self
            .gateway
            .channels_by_ids(&[winner.channel_id.clone()])
            .await?;
        let Some(channel) = channels.into_iter().find(|c| c.available) else {
            return Ok(Resolution::NoMatch(format!(
                "Winning candidate {} not retrievable",
                winner.channel_id
            )));
        };

        let confidence = score_candidate(&ScoreInputs {
            seed: name,
            title: &channel.title,
            description: &channel.description,
            popularity: channel.subscriber_count,
            rank,
        });

        {
            let mut storage = self.storage.lock().unwrap();
            storage.upsert_channel(&channel.to_record())?;
        }

        Ok(Resolution::Resolved(ResolvedSeed {
            channel_id: channel.channel_id,
            title: channel.title,
            confidence,
            method: ResolutionMethod::Search,
            rank: Some(rank),
        }))
    }
}

/// Returns the lookup handle for a handle-shaped seed name
///
/// A name qualifies when it starts with `@`, or when the trimmed name is
/// composed only of identifier-safe characters (alphanumerics, dots,
/// underscores, dashes). Names with internal spaces go to search instead.
fn as_handle(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('@') {
        let compact: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return None;
        }
        return Some(format!("@{}", compact));
    }

    let identifier_safe = trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-');
    if identifier_safe {
        Some(format!("@{}", trimmed))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_prefixed_names_are_handles() {
        assert_eq!(as_handle("@SomeArtist").as_deref(), Some("@SomeArtist"));
        assert_eq!(as_handle(" @Some Artist ").as_deref(), Some("@SomeArtist"));
    }

    #[test]
    fn test_identifier_safe_names_get_prefixed() {
        assert_eq!(as_handle("SomeArtist").as_deref(), Some("@SomeArtist"));
        assert_eq!(as_handle("some_artist-99").as_deref(), Some("@some_artist-99"));
    }

    #[test]
    fn test_names_with_internal_spaces_are_not_handles() {
        assert_eq!(as_handle("A.R. Rahman"), None);
        assert_eq!(as_handle("Zzz Nonexistent Channel 123"), None);
    }

    #[test]
    fn test_punctuated_names_are_not_handles() {
        // The dot is identifier-safe but the comma is not
        assert_eq!(as_handle("Rahman,A.R."), None);
        assert_eq!(as_handle("Artist(Official)"), None);
    }

    #[test]
    fn test_dotted_names_are_handles() {
        assert_eq!(as_handle("A.R.Rahman").as_deref(), Some("@A.R.Rahman"));
    }

    #[test]
    fn test_empty_and_bare_at_are_rejected() {
        assert_eq!(as_handle("   "), None);
        assert_eq!(as_handle("@"), None);
    }
}
