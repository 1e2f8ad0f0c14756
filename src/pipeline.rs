//! Pipeline orchestration
//!
//! This module wires the stages together: seed and override import,
//! resolution, uploads crawling, and metadata fetching. The context it
//! builds (config, storage handle, gateway) is created once at process start
//! and injected into every stage; nothing here is a global.

use crate::config::Config;
use crate::crawl::UploadsCrawler;
use crate::metadata::{MetadataFetcher, MetadataSummary};
use crate::resolve::{ResolutionSummary, Resolver};
use crate::storage::{OverrideRecord, RunStatus, SqliteStorage, Storage};
use crate::youtube::{YoutubeGateway, LIST_COST};
use crate::DiggerError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Counts from one full pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub resolution: ResolutionSummary,
    pub playlists_crawled: u32,
    pub videos_discovered: u32,
    pub metadata: MetadataSummary,
    pub quota_exhausted: bool,
}

/// The explicitly constructed run context
pub struct Pipeline {
    config: Config,
    storage: Arc<Mutex<SqliteStorage>>,
    gateway: YoutubeGateway,
    run_id: i64,
}

impl Pipeline {
    /// Builds the pipeline: opens storage, imports seeds and overrides from
    /// the config (both idempotent), and records a new run row
    pub fn new(config: Config, config_hash: &str) -> Result<Self, DiggerError> {
        let storage_path = Path::new(&config.output.database_path);
        let mut storage = SqliteStorage::new(storage_path)?;

        let seeds_imported = storage.upsert_seeds(&config.seeds.names)?;
        if seeds_imported > 0 {
            tracing::info!("Imported {} new seed names", seeds_imported);
        }

        for entry in &config.overrides {
            storage.upsert_override(&OverrideRecord {
                seed_name: entry.seed.clone(),
                channel_id: entry.channel_id.clone(),
                notes: entry.notes.clone(),
            })?;
        }
        if !config.overrides.is_empty() {
            tracing::info!("Imported {} overrides", config.overrides.len());
        }

        let run_id = storage.create_run(config_hash)?;
        tracing::info!("Starting run {}", run_id);

        let storage = Arc::new(Mutex::new(storage));
        let gateway = YoutubeGateway::new(&config.api, Arc::clone(&storage))?;

        Ok(Self {
            config,
            storage,
            gateway,
            run_id,
        })
    }

    /// Flips failed seeds back to pending before resolution
    pub fn reset_failed_seeds(&self) -> Result<usize, DiggerError> {
        let mut storage = self.storage.lock().unwrap();
        let reset = storage.reset_failed_seeds()?;
        if reset > 0 {
            tracing::info!("Reset {} failed seeds to pending", reset);
        }
        Ok(reset)
    }

    /// Stage 1: resolve pending seeds to channels
    pub async fn run_resolution(&self) -> Result<ResolutionSummary, DiggerError> {
        let resolver = Resolver::new(
            &self.gateway,
            Arc::clone(&self.storage),
            self.config.resolver.max_search_results,
        );
        let summary = resolver.run().await?;
        tracing::info!(
            "Resolution pass: {} resolved, {} failed, {} skipped",
            summary.resolved,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    /// Stage 2: crawl the uploads playlist of every resolved channel
    ///
    /// Returns (playlists touched, videos discovered, quota exhausted).
    pub async fn run_crawl(&self) -> Result<(u32, u32, bool), DiggerError> {
        let channels = {
            let storage = self.storage.lock().unwrap();
            storage.get_channels_with_uploads()?
        };

        let crawler = UploadsCrawler::new(
            &self.gateway,
            Arc::clone(&self.storage),
            self.config.crawler.max_pages_per_run,
        );

        let mut playlists = 0;
        let mut discovered = 0;
        let mut quota_exhausted = false;

        for channel in channels {
            let Some(playlist_id) = channel.uploads_playlist_id.as_deref() else {
                continue;
            };

            let outcome = crawler
                .crawl_uploads(playlist_id, &channel.channel_id, &channel.title)
                .await?;

            playlists += 1;
            discovered += outcome.newly_inserted;
            tracing::info!(
                "Crawled {} ({}): {} new videos, {} seen, complete: {}",
                channel.title,
                playlist_id,
                outcome.newly_inserted,
                outcome.total_seen,
                outcome.completed
            );

            // An incomplete walk with no budget left means the whole stage
            // is out of quota; later playlists would stop immediately too
            if !outcome.completed && !self.gateway.can_afford(LIST_COST)? {
                quota_exhausted = true;
                break;
            }
        }

        Ok((playlists, discovered, quota_exhausted))
    }

    /// Stage 3: fetch metadata for pending videos
    pub async fn run_metadata(&self) -> Result<MetadataSummary, DiggerError> {
        let fetcher = MetadataFetcher::new(&self.gateway, Arc::clone(&self.storage));
        let summary = fetcher.run().await?;
        tracing::info!(
            "Metadata pass: {} fetched, {} failed",
            summary.fetched,
            summary.failed
        );
        Ok(summary)
    }

    /// Runs all stages in order, stopping early once quota runs out
    pub async fn run_all(&self) -> Result<RunSummary, DiggerError> {
        let mut summary = RunSummary::default();

        summary.resolution = self.run_resolution().await?;
        if summary.resolution.quota_exhausted {
            summary.quota_exhausted = true;
            return Ok(summary);
        }

        let (playlists, discovered, crawl_quota) = self.run_crawl().await?;
        summary.playlists_crawled = playlists;
        summary.videos_discovered = discovered;
        if crawl_quota {
            summary.quota_exhausted = true;
            return Ok(summary);
        }

        summary.metadata = self.run_metadata().await?;
        summary.quota_exhausted = summary.metadata.quota_exhausted;

        Ok(summary)
    }

    /// Records the run's final status
    pub fn finish(&self, quota_exhausted: bool) -> Result<(), DiggerError> {
        let status = if quota_exhausted {
            RunStatus::QuotaExhausted
        } else {
            RunStatus::Completed
        };
        let mut storage = self.storage.lock().unwrap();
        storage.finish_run(self.run_id, status)?;
        Ok(())
    }

    /// Records the run as failed
    pub fn finish_failed(&self) -> Result<(), DiggerError> {
        let mut storage = self.storage.lock().unwrap();
        storage.finish_run(self.run_id, RunStatus::Failed)?;
        Ok(())
    }

    /// Shared storage handle, for reporting after a run
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    /// Units still spendable today
    pub fn remaining_budget(&self) -> Result<u32, DiggerError> {
        Ok(self.gateway.remaining_budget()?)
    }
}
