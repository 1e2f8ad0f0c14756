//! Crate-Digger: a quota-aware music catalog builder
//!
//! This crate builds a local catalog of music channels and their uploads from
//! the YouTube Data API. It resolves free-text artist names to canonical
//! channel IDs, walks each channel's uploads playlist, and fetches per-video
//! metadata, all under a hard daily quota budget with crash-safe resume.

pub mod config;
pub mod crawl;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod quota;
pub mod resolve;
pub mod storage;
pub mod youtube;

use thiserror::Error;

/// Main error type for Crate-Digger operations
#[derive(Debug, Error)]
pub enum DiggerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] youtube::ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Crate-Digger operations
pub type Result<T> = std::result::Result<T, DiggerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use storage::{Availability, MetaStatus, ResolutionMethod, SeedStatus};
pub use youtube::ApiError;
