//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::quota::{today_utc, CostLedger};
use crate::storage::Storage;
use crate::{Availability, DiggerError, MetaStatus, SeedStatus};
use std::collections::HashMap;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Count of seeds by resolution status
    pub seeds_by_status: HashMap<SeedStatus, u64>,

    /// Total number of channels
    pub total_channels: u64,

    /// Total number of videos discovered
    pub total_videos: u64,

    /// Count of videos by metadata status
    pub videos_by_meta_status: HashMap<MetaStatus, u64>,

    /// Count of videos by availability
    pub videos_by_availability: HashMap<Availability, u64>,

    /// Videos flagged as shorts
    pub shorts: u64,

    /// Fetched videos still considered music candidates
    pub music_candidates: u64,

    /// Quota units spent today (non-cached calls only)
    pub quota_spent_today: u32,

    /// Quota units still spendable today
    pub quota_remaining_today: u32,

    /// Audit log counts: (total calls, cache hits)
    pub call_counts: (u64, u64),
}

/// Loads statistics from storage
pub fn load_statistics(
    storage: &dyn Storage,
    ledger: &CostLedger,
) -> Result<CatalogStatistics, DiggerError> {
    let mut seeds_by_status = HashMap::new();
    for status in SeedStatus::all_statuses() {
        let count = storage.count_seeds_by_status(status)?;
        if count > 0 {
            seeds_by_status.insert(status, count);
        }
    }

    let mut videos_by_meta_status = HashMap::new();
    for status in MetaStatus::all_statuses() {
        let count = storage.count_videos_by_meta_status(status)?;
        if count > 0 {
            videos_by_meta_status.insert(status, count);
        }
    }

    let mut videos_by_availability = HashMap::new();
    for availability in Availability::all_statuses() {
        let count = storage.count_videos_by_availability(availability)?;
        if count > 0 {
            videos_by_availability.insert(availability, count);
        }
    }

    let quota_spent_today = storage.sum_cost_for_day(&today_utc())?;

    Ok(CatalogStatistics {
        seeds_by_status,
        total_channels: storage.count_channels()?,
        total_videos: storage.count_videos()?,
        videos_by_meta_status,
        videos_by_availability,
        shorts: storage.count_shorts()?,
        music_candidates: storage.count_music_candidates()?,
        quota_spent_today,
        quota_remaining_today: ledger.remaining(storage)?,
        call_counts: storage.audit_counts()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Seeds:");
    let mut seed_counts: Vec<_> = stats.seeds_by_status.iter().collect();
    seed_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (status, count) in seed_counts {
        println!("  {}: {}", status.to_db_string(), count);
    }
    println!();

    println!("Catalog:");
    println!("  Channels: {}", stats.total_channels);
    println!("  Videos discovered: {}", stats.total_videos);
    for (status, count) in &stats.videos_by_meta_status {
        println!("  Videos {}: {}", status.to_db_string(), count);
    }
    for (availability, count) in &stats.videos_by_availability {
        println!("  Videos {}: {}", availability.to_db_string(), count);
    }
    println!("  Shorts: {}", stats.shorts);
    println!("  Music candidates: {}", stats.music_candidates);
    println!();

    println!("Quota:");
    println!("  Spent today: {} units", stats.quota_spent_today);
    println!("  Remaining today: {} units", stats.quota_remaining_today);

    let (total_calls, cache_hits) = stats.call_counts;
    let hit_ratio = if total_calls > 0 {
        (cache_hits as f64 / total_calls as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  API calls logged: {} ({} cache hits, {:.1}%)",
        total_calls, cache_hits, hit_ratio
    );
}
