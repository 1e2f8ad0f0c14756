use serde::Deserialize;

/// Main configuration structure for Crate-Digger
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: SeedList,
    #[serde(default, rename = "override")]
    pub overrides: Vec<OverrideEntry>,
}

/// Upstream API access and quota configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API key sent with every request (never part of cache signatures)
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Base URL of the API, overridable for testing against a local server
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Daily quota budget in upstream units
    #[serde(rename = "daily-quota-budget")]
    pub daily_quota_budget: u32,

    /// Units held back from the budget and never spent
    #[serde(rename = "quota-safety-buffer", default = "default_safety_buffer")]
    pub quota_safety_buffer: u32,

    /// Minimum spacing between consecutive outbound calls (milliseconds)
    #[serde(rename = "request-spacing-ms", default = "default_spacing_ms")]
    pub request_spacing_ms: u64,

    /// Maximum attempts per call before a transient failure is surfaced
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Ceiling on any single retry delay (milliseconds)
    #[serde(rename = "retry-max-delay-ms", default = "default_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt
    #[serde(rename = "retry-backoff-factor", default = "default_backoff_factor")]
    pub retry_backoff_factor: f64,
}

/// Resolution engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Candidates retrieved per search
    #[serde(rename = "max-search-results", default = "default_max_search_results")]
    pub max_search_results: u32,
}

/// Uploads crawler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page cap per playlist per run; 0 means unlimited
    #[serde(rename = "max-pages-per-run", default)]
    pub max_pages_per_run: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Seed names awaiting resolution
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedList {
    #[serde(default)]
    pub names: Vec<String>,
}

/// Manual mapping from a seed name to a canonical channel ID
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideEntry {
    /// Seed name exactly as it appears in the seed list
    pub seed: String,

    /// Canonical channel ID this seed resolves to
    #[serde(rename = "channel-id")]
    pub channel_id: String,

    /// Free-text notes on why the override exists
    #[serde(default)]
    pub notes: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_search_results: default_max_search_results(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_run: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_safety_buffer() -> u32 {
    500
}

fn default_spacing_ms() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_search_results() -> u32 {
    5
}
