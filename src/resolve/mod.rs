//! Seed-name resolution
//!
//! Maps an untrusted free-text seed name to a canonical channel ID using a
//! layered strategy: manual override, then direct handle lookup, then ranked
//! text search scored by a deterministic rubric.

mod engine;
mod scoring;

pub use engine::{Resolution, ResolutionSummary, ResolvedSeed, Resolver};
pub use scoring::{
    score_candidate, ScoreInputs, HANDLE_MIN_SCORE, SEARCH_MIN_SCORE,
};
