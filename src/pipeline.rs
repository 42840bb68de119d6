//! Orchestration of cache lookup, network fetch, and artifact derivation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::fetcher::{fetch_all_posts, FetchError, RetryPolicy};
use crate::models::Post;
use crate::progress::ProgressObserver;

/// Ties the cache, the fetcher, and the derivation step together.
pub struct AcquisitionPipeline {
    client: Client,
    cache: CacheStore,
    base_url: String,
    ttl: Duration,
    policy: RetryPolicy,
}

impl AcquisitionPipeline {
    /// Build a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config, cache: CacheStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            cache,
            base_url: config.base_url.clone(),
            ttl: config.cache_ttl(),
            policy: RetryPolicy {
                max_retries: config.max_retries,
                backoff_factor: config.backoff_factor,
            },
        })
    }

    /// Produce the full post sequence for a topic, from cache or network.
    ///
    /// On a fresh fetch the raw cache is fully overwritten; derived artifacts
    /// are recomputed on every successful run, cache hit included. A failed
    /// fetch leaves any previous cache untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`FetchError`] from the fetcher. Cache and derived-file
    /// write failures are logged, never fatal.
    pub async fn acquire(
        &self,
        topic_id: u64,
        progress: &dyn ProgressObserver,
    ) -> Result<Vec<Post>, FetchError> {
        if let Some(posts) = self.cache.load_raw(topic_id, self.ttl).await {
            progress.on_progress(1, 1);
            self.write_derived(topic_id, &posts).await;
            return Ok(posts);
        }

        info!(topic_id, base_url = %self.base_url, "Fetching topic from the network");
        let posts =
            fetch_all_posts(&self.client, &self.base_url, topic_id, &self.policy, progress).await?;

        if let Err(e) = self.cache.save_raw(topic_id, &posts).await {
            warn!(topic_id, "Failed to write raw cache, continuing with fetched data: {e:#}");
        }
        self.write_derived(topic_id, &posts).await;

        Ok(posts)
    }

    /// The backing store, for artifact path reporting.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    async fn write_derived(&self, topic_id: u64, posts: &[Post]) {
        if let Err(e) = self.cache.save_derived(topic_id, &self.base_url, posts).await {
            warn!(topic_id, "Failed to write derived artifacts: {e:#}");
        }
    }
}
