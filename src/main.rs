//! CLI front end: argument parsing, progress display, prompt generation.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discourse_topic_harvester::cache::CacheStore;
use discourse_topic_harvester::config::Config;
use discourse_topic_harvester::grouper::{clean_post, find_root_post};
use discourse_topic_harvester::pipeline::AcquisitionPipeline;
use discourse_topic_harvester::progress::ChannelProgress;
use discourse_topic_harvester::prompt::generate_prompt;

/// Harvest a Discourse topic into cached, analysis-ready artifacts.
#[derive(Parser)]
#[command(
    name = "discourse-topic-harvester",
    version,
    about = "Fetch a forum topic, cache it, and derive grouped replies and a transcript"
)]
struct Cli {
    /// Topic URL (e.g. https://forum.example.com/t/topic/12345) or a bare
    /// numeric topic id.
    topic: String,

    /// File containing the applicant's card request and credit history; when
    /// given, the analysis prompt is generated alongside the other artifacts.
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Prompt template to fill in.
    #[arg(long, default_value = "prompt_template.md")]
    template: PathBuf,
}

static TOPIC_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/t/(?:topic/)?(\d+)").expect("invalid topic id pattern"));

/// Pull a numeric topic id out of a forum URL or a bare id string.
fn parse_topic_id(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        return Some(id);
    }
    TOPIC_ID_PATTERN
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(
        base_url = %config.base_url,
        cache_hours = config.cache_duration_hours,
        "Configuration loaded"
    );

    let Some(topic_id) = parse_topic_id(&cli.topic) else {
        bail!(
            "could not find a topic id in '{}'; expected something like {}/t/topic/12345",
            cli.topic,
            config.base_url
        );
    };
    info!(topic_id, "Starting acquisition");

    let cache = CacheStore::new(config.cache_dir.clone());
    let pipeline =
        AcquisitionPipeline::new(&config, cache.clone()).context("Failed to build pipeline")?;

    let (observer, mut updates) = ChannelProgress::new();
    let reporter = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            let percent = if update.total == 0 {
                100
            } else {
                update.current * 100 / update.total
            };
            info!(
                current = update.current,
                total = update.total,
                percent,
                "Download progress"
            );
        }
    });

    let result = pipeline.acquire(topic_id, &observer).await;
    drop(observer);
    let _ = reporter.await;

    let posts =
        result.with_context(|| format!("No data could be retrieved for topic {topic_id}"))?;
    info!(count = posts.len(), "Posts available");

    if let Some(root) = find_root_post(&posts) {
        let cleaned = clean_post(&config.base_url, root);
        let preview: String = cleaned.reply_content.chars().take(200).collect();
        info!(
            author = %cleaned.username,
            user_id = cleaned.user_id,
            created_at = %cleaned.created_at,
            "Root post: {}",
            preview.trim()
        );
    } else {
        warn!(topic_id, "No root post (post_number == 1) found in this topic");
    }

    if let Some(history_file) = cli.history_file.as_deref() {
        let history = tokio::fs::read_to_string(history_file)
            .await
            .with_context(|| {
                format!("Failed to read history file: {}", history_file.display())
            })?;
        generate_prompt(&cli.template, &cache.prompt_path(topic_id), history.trim()).await?;
    }

    info!(
        grouped = %cache.grouped_path(topic_id).display(),
        transcript = %cache.transcript_path(topic_id).display(),
        "Artifacts ready"
    );

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,discourse_topic_harvester=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_topic_id;

    #[test]
    fn parses_bare_ids_and_urls() {
        assert_eq!(parse_topic_id("12345"), Some(12345));
        assert_eq!(parse_topic_id(" 12345 "), Some(12345));
        assert_eq!(
            parse_topic_id("https://www.uscardforum.com/t/topic/12345"),
            Some(12345)
        );
        assert_eq!(
            parse_topic_id("https://forum.example.com/t/12345"),
            Some(12345)
        );
        assert_eq!(
            parse_topic_id("https://forum.example.com/t/some-slug/12345/7"),
            None,
            "slugged urls without /t/<id> or /t/topic/<id> are rejected"
        );
        assert_eq!(parse_topic_id("no id here"), None);
    }
}
