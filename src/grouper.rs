//! Grouping and ordering of topic replies by author.

use std::collections::HashMap;

use crate::cleaner::clean_html;
use crate::models::{AuthorGroup, CleanedPost, Post};

/// Convert a raw post into its cleaned, linkable form.
#[must_use]
pub fn clean_post(base_url: &str, post: &Post) -> CleanedPost {
    CleanedPost {
        post_number: post.post_number,
        user_id: post.user_id,
        username: post.username.clone(),
        created_at: post.created_at.clone(),
        reply_to_post_number: post.reply_to_post_number,
        reply_content: clean_html(&post.cooked),
        original_post_url: format!(
            "{base_url}/t/topic/{}/{}",
            post.topic_id, post.post_number
        ),
    }
}

/// Find the topic's root post (`post_number == 1`).
#[must_use]
pub fn find_root_post(posts: &[Post]) -> Option<&Post> {
    posts.iter().find(|p| p.post_number == 1)
}

struct Bucket {
    group: AuthorGroup,
    first_post_number: u32,
}

/// Partition non-root posts by author and order everything deterministically.
///
/// The root post is excluded; every other post appears exactly once. Replies
/// within a group are sorted by `post_number` ascending, and groups are sorted
/// by the author's earliest reply. Ties cannot occur because `post_number` is
/// unique within a topic. Pure function, no I/O.
#[must_use]
pub fn group_replies_by_author(base_url: &str, posts: &[Post]) -> Vec<AuthorGroup> {
    let mut buckets: HashMap<i64, Bucket> = HashMap::new();

    for post in posts.iter().filter(|p| p.post_number > 1) {
        let bucket = buckets.entry(post.user_id).or_insert_with(|| Bucket {
            group: AuthorGroup {
                username: post.username.clone(),
                user_id: post.user_id,
                replies: Vec::new(),
            },
            first_post_number: post.post_number,
        });
        bucket.first_post_number = bucket.first_post_number.min(post.post_number);
        bucket.group.replies.push(clean_post(base_url, post));
    }

    let mut buckets: Vec<Bucket> = buckets.into_values().collect();
    for bucket in &mut buckets {
        bucket.group.replies.sort_by_key(|r| r.post_number);
    }
    buckets.sort_by_key(|b| b.first_post_number);
    buckets.into_iter().map(|b| b.group).collect()
}
