//! Market News Bot — Binary Entrypoint
//! Loads config, wires the feed sources and external collaborators, and runs
//! the fetch → gate → summarize → publish pass (once, or on an interval).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_news_bot::config::BotConfig;
use market_news_bot::ingest::rss::RssFeed;
use market_news_bot::ingest::types::FeedSource;
use market_news_bot::pipeline::Pipeline;
use market_news_bot::publish::WebhookPublisher;
use market_news_bot::summarize::GeminiSummarizer;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_news_bot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = BotConfig::load_default()?;
    if cfg.sources.is_empty() {
        tracing::warn!("no sources configured; nothing to do");
        return Ok(());
    }

    let sources: Vec<(_, Box<dyn FeedSource>)> = cfg
        .sources
        .iter()
        .map(|sc| {
            let feed: Box<dyn FeedSource> = Box::new(
                RssFeed::from_url(&sc.name, &sc.url)
                    .with_limit(sc.limit)
                    .with_skip_keywords(cfg.skip_keywords.clone()),
            );
            (sc.clone(), feed)
        })
        .collect();

    let summarizer = Arc::new(GeminiSummarizer::from_env(&cfg.summarize.model)?);
    let publisher = Arc::new(WebhookPublisher::from_env()?);

    let poll_interval = cfg.run.poll_interval_secs;
    let mut pipeline = Pipeline::new(cfg, sources, summarizer, publisher)?;

    match poll_interval {
        Some(secs) => pipeline.run_forever(Duration::from_secs(secs)).await,
        None => {
            pipeline.run_once().await;
        }
    }
    Ok(())
}
