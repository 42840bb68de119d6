//! Discourse topic harvester library.
//!
//! Fetches every post of a Discourse topic through the paginated JSON API,
//! caches the raw result on disk with a configurable TTL, and derives a
//! per-author grouped reply set plus a human-readable transcript for a
//! downstream prompt-generation step.

pub mod cache;
pub mod cleaner;
pub mod config;
pub mod constants;
pub mod fetcher;
pub mod grouper;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod prompt;
