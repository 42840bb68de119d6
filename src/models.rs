//! Data model for raw and derived topic posts.

use serde::{Deserialize, Serialize};

/// A raw Discourse post as returned by the topic JSON API.
///
/// Immutable once fetched. `post_number == 1` identifies the topic's root
/// post; uniqueness of `post_number` within a topic is assumed upstream, not
/// enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_number: u32,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reply_to_post_number: Option<u32>,
    /// Rendered HTML body (the Discourse `cooked` field).
    #[serde(default)]
    pub cooked: String,
    #[serde(default)]
    pub topic_id: u64,
}

/// One page of the topic JSON API response.
#[derive(Debug, Deserialize)]
pub struct TopicResponse {
    /// Total number of posts in the topic. Only meaningful on page 1.
    #[serde(default)]
    pub posts_count: u64,
    pub post_stream: PostStream,
}

#[derive(Debug, Deserialize)]
pub struct PostStream {
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// A post with markup stripped, ready for prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedPost {
    pub post_number: u32,
    pub user_id: i64,
    pub username: String,
    pub created_at: String,
    pub reply_to_post_number: Option<u32>,
    pub reply_content: String,
    pub original_post_url: String,
}

/// All replies from one author, ordered by post number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorGroup {
    pub username: String,
    pub user_id: i64,
    pub replies: Vec<CleanedPost>,
}
