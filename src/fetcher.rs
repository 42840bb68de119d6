//! Paginated topic fetching with bounded retries and exponential backoff.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::models::{Post, TopicResponse};
use crate::progress::ProgressObserver;

/// Pause between page requests to stay under forum rate limits.
const PAGE_THROTTLE: Duration = Duration::from_millis(200);

/// Retry budget for a single page request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts allowed after the first failure.
    pub max_retries: u32,
    /// Backoff scale in seconds; attempt `n` sleeps `backoff_factor * 2^n`.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let exp = f64::from(attempt.min(20)).exp2();
        Duration::from_secs_f64((self.backoff_factor * exp).max(0.0))
    }
}

/// Why a fetch was abandoned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {page} request still failing after {attempts} attempts: {reason}")]
    RetriesExhausted {
        page: u32,
        attempts: u32,
        reason: String,
    },
    #[error("blocked by an anti-bot challenge (HTTP {status}); the forum is refusing automated requests")]
    Challenge { status: StatusCode },
    #[error("unexpected HTTP status {status} fetching page {page}")]
    Status { status: StatusCode, page: u32 },
    #[error("failed to decode the page {page} response: {source}")]
    Decode {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("topic {topic_id} has no posts or is not a valid topic")]
    NoPosts { topic_id: u64 },
}

/// Attempt-loop state for one page request.
///
/// An explicit enum keeps the termination conditions auditable: every
/// transition either moves toward `Completed` or ends in `Aborted`.
enum PageState {
    Fetching { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Completed(TopicResponse),
    Aborted(FetchError),
}

/// Outcome of a single HTTP attempt, split by retryability.
enum AttemptError {
    Transient(String),
    Fatal(FetchError),
}

/// Server-side statuses worth retrying.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// Statuses produced by anti-bot or rate-limiting layers.
fn is_challenge_status(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}

async fn request_page(
    client: &Client,
    base_url: &str,
    topic_id: u64,
    page: u32,
) -> Result<TopicResponse, AttemptError> {
    let url = format!("{base_url}/t/{topic_id}.json?page={page}");
    debug!(url = %url, "Requesting topic page");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| AttemptError::Transient(format!("{e:#}")))?;
    let status = response.status();

    if is_transient_status(status) {
        return Err(AttemptError::Transient(format!("HTTP {status}")));
    }
    if is_challenge_status(status) {
        return Err(AttemptError::Fatal(FetchError::Challenge { status }));
    }
    if !status.is_success() {
        return Err(AttemptError::Fatal(FetchError::Status { status, page }));
    }

    response
        .json::<TopicResponse>()
        .await
        .map_err(|source| AttemptError::Fatal(FetchError::Decode { page, source }))
}

/// Fetch one page, retrying transient failures under the policy.
async fn fetch_page(
    client: &Client,
    base_url: &str,
    topic_id: u64,
    page: u32,
    policy: &RetryPolicy,
) -> Result<TopicResponse, FetchError> {
    let mut state = PageState::Fetching { attempt: 0 };
    loop {
        state = match state {
            PageState::Fetching { attempt } => {
                match request_page(client, base_url, topic_id, page).await {
                    Ok(body) => PageState::Completed(body),
                    Err(AttemptError::Transient(reason)) if attempt < policy.max_retries => {
                        warn!(page, attempt, %reason, "Transient failure, will retry");
                        PageState::Retrying {
                            attempt,
                            delay: policy.delay(attempt),
                        }
                    }
                    Err(AttemptError::Transient(reason)) => {
                        PageState::Aborted(FetchError::RetriesExhausted {
                            page,
                            attempts: attempt + 1,
                            reason,
                        })
                    }
                    Err(AttemptError::Fatal(err)) => PageState::Aborted(err),
                }
            }
            PageState::Retrying { attempt, delay } => {
                sleep(delay).await;
                PageState::Fetching {
                    attempt: attempt + 1,
                }
            }
            PageState::Completed(body) => return Ok(body),
            PageState::Aborted(err) => return Err(err),
        };
    }
}

/// Collect every post of a topic by walking the paginated JSON API.
///
/// Pagination is strictly sequential: each page's body is needed to decide
/// whether more pages exist. Page 1's declared `posts_count` is the stop
/// target; an empty post list also stops the walk, since the declared total
/// can over-count when posts were deleted mid-thread. Progress is reported
/// after every page.
///
/// The fetcher performs no cache I/O; persisting a successful result is the
/// caller's job.
///
/// # Errors
///
/// Returns a [`FetchError`] when retries are exhausted, a non-retryable
/// response is received, or the topic yields no posts.
pub async fn fetch_all_posts(
    client: &Client,
    base_url: &str,
    topic_id: u64,
    policy: &RetryPolicy,
    progress: &dyn ProgressObserver,
) -> Result<Vec<Post>, FetchError> {
    let mut collected: Vec<Post> = Vec::new();
    let mut declared_total: u64 = 0;
    let mut page: u32 = 1;

    loop {
        let body = fetch_page(client, base_url, topic_id, page, policy).await?;

        if page == 1 {
            declared_total = body.posts_count;
            if declared_total == 0 {
                return Err(FetchError::NoPosts { topic_id });
            }
        }

        let posts = body.post_stream.posts;
        if posts.is_empty() {
            break;
        }

        collected.extend(posts);
        progress.on_progress(collected.len() as u64, declared_total);

        if collected.len() as u64 >= declared_total {
            break;
        }

        page += 1;
        sleep(PAGE_THROTTLE).await;
    }

    if collected.is_empty() {
        return Err(FetchError::NoPosts { topic_id });
    }

    debug!(topic_id, count = collected.len(), "Pagination complete");
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_factor: 1.5,
        };
        assert_eq!(policy.delay(0), Duration::from_secs_f64(1.5));
        assert_eq!(policy.delay(1), Duration::from_secs_f64(3.0));
        assert_eq!(policy.delay(2), Duration::from_secs_f64(6.0));
    }

    #[test]
    fn zero_factor_means_no_delay() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_factor: 0.0,
        };
        assert_eq!(policy.delay(3), Duration::ZERO);
    }

    #[test]
    fn transient_statuses_match_server_errors() {
        for code in [500, 502, 503, 504] {
            assert!(is_transient_status(StatusCode::from_u16(code).unwrap()));
        }
        for code in [403, 404, 410, 429] {
            assert!(!is_transient_status(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn challenge_statuses_are_distinct_from_generic_failures() {
        assert!(is_challenge_status(StatusCode::FORBIDDEN));
        assert!(is_challenge_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_challenge_status(StatusCode::NOT_FOUND));
        assert!(!is_challenge_status(StatusCode::BAD_GATEWAY));
    }
}
