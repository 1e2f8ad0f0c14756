//! Configuration loading, parsing, and validation
//!
//! Configuration is a single TOML file holding API credentials and limits,
//! crawler knobs, the seed name list, and manual resolution overrides.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    ApiConfig, Config, CrawlerConfig, OutputConfig, OverrideEntry, ResolverConfig, SeedList,
};
pub use validation::validate;
