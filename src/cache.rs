//! Flat-file cache for raw posts and their derived artifacts.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::grouper::group_replies_by_author;
use crate::models::{AuthorGroup, Post};

/// Owns all on-disk state for fetched topics.
///
/// Raw fetches live under an `internal/` subdirectory; derived artifacts sit
/// at the cache root. Single-writer access is assumed; concurrent runs
/// against the same topic id must be avoided by the caller.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the raw post array for a topic.
    #[must_use]
    pub fn raw_path(&self, topic_id: u64) -> PathBuf {
        self.root
            .join("internal")
            .join(format!("{topic_id}_raw.json"))
    }

    /// Path of the derived per-author JSON document.
    #[must_use]
    pub fn grouped_path(&self, topic_id: u64) -> PathBuf {
        self.root.join(format!("{topic_id}_grouped.json"))
    }

    /// Path of the derived plain-text transcript.
    #[must_use]
    pub fn transcript_path(&self, topic_id: u64) -> PathBuf {
        self.root.join(format!("{topic_id}_transcript.txt"))
    }

    /// Path of the generated analysis prompt.
    #[must_use]
    pub fn prompt_path(&self, topic_id: u64) -> PathBuf {
        self.root.join(format!("{topic_id}_prompt.md"))
    }

    /// Load the cached raw posts for a topic if the cache file is fresh.
    ///
    /// Any read or parse failure degrades to a miss, as does an entry older
    /// than `ttl`. Never fatal.
    pub async fn load_raw(&self, topic_id: u64, ttl: Duration) -> Option<Vec<Post>> {
        let path = self.raw_path(topic_id);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => {
                debug!(path = %path.display(), "No raw cache file");
                return None;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .unwrap_or(Duration::ZERO);
        if age >= ttl {
            info!(topic_id, age_secs = age.as_secs(), "Raw cache expired, refetching");
            return None;
        }

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read raw cache, treating as miss: {e}");
                return None;
            }
        };

        match serde_json::from_str::<Vec<Post>>(&contents) {
            Ok(posts) => {
                info!(topic_id, count = posts.len(), "Raw cache hit");
                Some(posts)
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to parse raw cache, treating as miss: {e}");
                None
            }
        }
    }

    /// Overwrite the raw cache for a topic, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails; callers treat
    /// this as non-fatal since the in-memory posts are still usable.
    pub async fn save_raw(&self, topic_id: u64, posts: &[Post]) -> Result<()> {
        let path = self.raw_path(topic_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(posts).context("Failed to serialize raw posts")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write raw cache: {}", path.display()))?;

        info!(topic_id, count = posts.len(), path = %path.display(), "Raw cache written");
        Ok(())
    }

    /// Compute the author groups and write both derived artifacts.
    ///
    /// Safe to recompute on every run; both files are fully overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written; callers treat this
    /// as non-fatal.
    pub async fn save_derived(&self, topic_id: u64, base_url: &str, posts: &[Post]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.with_context(|| {
            format!("Failed to create cache directory: {}", self.root.display())
        })?;

        let groups = group_replies_by_author(base_url, posts);

        let grouped_path = self.grouped_path(topic_id);
        let json =
            serde_json::to_string_pretty(&groups).context("Failed to serialize author groups")?;
        tokio::fs::write(&grouped_path, json)
            .await
            .with_context(|| format!("Failed to write grouped JSON: {}", grouped_path.display()))?;

        let transcript_path = self.transcript_path(topic_id);
        tokio::fs::write(&transcript_path, render_transcript(&groups))
            .await
            .with_context(|| {
                format!("Failed to write transcript: {}", transcript_path.display())
            })?;

        info!(topic_id, authors = groups.len(), "Derived artifacts written");
        Ok(())
    }
}

/// Render the transcript: one header line per author, one
/// `created_at: content` line per reply, blank line between authors.
fn render_transcript(groups: &[AuthorGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("\"username\": \"{}\"\n", group.username));
        for reply in &group.replies {
            let content = reply.reply_content.replace('\n', " ");
            out.push_str(&format!("{}: {content}\n", reply.created_at));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleanedPost;

    fn reply(post_number: u32, created_at: &str, content: &str) -> CleanedPost {
        CleanedPost {
            post_number,
            user_id: 11,
            username: "bob".to_string(),
            created_at: created_at.to_string(),
            reply_to_post_number: None,
            reply_content: content.to_string(),
            original_post_url: String::new(),
        }
    }

    #[test]
    fn transcript_format_per_author() {
        let groups = vec![
            AuthorGroup {
                username: "bob".to_string(),
                user_id: 11,
                replies: vec![
                    reply(2, "2025-01-02", "first"),
                    reply(4, "2025-01-04", "multi\nline"),
                ],
            },
            AuthorGroup {
                username: "carol".to_string(),
                user_id: 12,
                replies: vec![reply(3, "2025-01-03", "second")],
            },
        ];

        let text = render_transcript(&groups);
        assert_eq!(
            text,
            "\"username\": \"bob\"\n\
             2025-01-02: first\n\
             2025-01-04: multi line\n\
             \n\
             \"username\": \"carol\"\n\
             2025-01-03: second\n\
             \n"
        );
    }

    #[test]
    fn transcript_of_no_groups_is_empty() {
        assert_eq!(render_transcript(&[]), "");
    }
}
