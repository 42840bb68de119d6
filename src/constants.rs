//! Shared constants used across the application.

/// Default user agent string for topic page requests.
///
/// This is a realistic browser user agent; some Discourse instances sit behind
/// anti-bot proxies that reject obvious script traffic.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
