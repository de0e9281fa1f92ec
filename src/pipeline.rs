//! Sequential run orchestration: fetch → gate → summarize → publish → record.
//!
//! One pass over the configured sources per run, one candidate at a time.
//! State is persisted immediately after each accepted item, so a crash
//! mid-run loses at most the in-flight item.
//!
//! Recording rules after an ACCEPT:
//! - summarize and publish both succeeded → record link and content
//!   fingerprint;
//! - either downstream call failed → record the link only (avoids retrying
//!   a poisoned item forever) and leave the fingerprint out (nothing was
//!   published, so there is nothing to deduplicate against).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::{BotConfig, SourceConfig};
use crate::dedup::fingerprint::normalize_fingerprint;
use crate::dedup::{DedupGate, GateDecision};
use crate::ingest::types::{CandidateItem, FeedSource};
use crate::publish::{compose_post, Publisher};
use crate::store::{SeenSet, StateStore};
use crate::summarize::{summarize_with_retry, Summarizer};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub accepted: usize,
    pub posted: usize,
    pub duplicate_link: usize,
    pub duplicate_content: usize,
    pub failed: usize,
}

pub struct Pipeline {
    cfg: BotConfig,
    gate: DedupGate,
    sources: Vec<(SourceConfig, Box<dyn FeedSource>)>,
    summarizer: Arc<dyn Summarizer>,
    publisher: Arc<dyn Publisher>,
    store: StateStore,
    links: HashMap<String, SeenSet>, // keyed by source state key
    content: SeenSet,
}

impl Pipeline {
    /// Reads all persisted seen-state into memory up front; the files are
    /// only ever hundreds to a couple thousand lines.
    pub fn new(
        cfg: BotConfig,
        sources: Vec<(SourceConfig, Box<dyn FeedSource>)>,
        summarizer: Arc<dyn Summarizer>,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self> {
        let store = StateStore::new(&cfg.run.state_dir);
        let mut links = HashMap::new();
        for (sc, _) in &sources {
            let key = sc.state_key();
            let set = store.load_links(&key, cfg.gate.link_capacity)?;
            links.insert(key, set);
        }
        let content = store.load_content(cfg.gate.content_capacity)?;
        let gate = DedupGate::new(cfg.gate.gate_config());

        Ok(Self {
            cfg,
            gate,
            sources,
            summarizer,
            publisher,
            store,
            links,
            content,
        })
    }

    /// One full pass over all sources. Failures are isolated per item and
    /// per source; nothing here aborts the run.
    pub async fn run_once(&mut self) -> RunReport {
        let started_at = chrono::Utc::now();
        let mut report = RunReport::default();
        for idx in 0..self.sources.len() {
            if report.posted >= self.cfg.run.max_posts_per_run {
                break;
            }
            self.process_source(idx, &mut report).await;
        }
        tracing::info!(
            target: "pipeline",
            started_at = %started_at.to_rfc3339(),
            fetched = report.fetched,
            accepted = report.accepted,
            posted = report.posted,
            duplicate_link = report.duplicate_link,
            duplicate_content = report.duplicate_content,
            failed = report.failed,
            "run finished"
        );
        report
    }

    /// Loop mode for long-running deployments.
    pub async fn run_forever(&mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    async fn process_source(&mut self, idx: usize, report: &mut RunReport) {
        let (sc, items) = {
            let (sc, feed) = &self.sources[idx];
            match feed.fetch_latest().await {
                Ok(items) => (sc.clone(), items),
                Err(e) => {
                    // "no candidate available", not fatal to the run
                    tracing::warn!(
                        target: "pipeline",
                        source = feed.name(),
                        error = ?e,
                        "feed fetch failed"
                    );
                    return;
                }
            }
        };

        if items.is_empty() {
            tracing::debug!(target: "pipeline", source = %sc.name, "feed returned no items");
            return;
        }
        report.fetched += items.len();

        for item in items {
            if report.posted >= self.cfg.run.max_posts_per_run {
                break;
            }
            self.process_item(&sc, item, report).await;
        }
    }

    async fn process_item(&mut self, sc: &SourceConfig, item: CandidateItem, report: &mut RunReport) {
        let key = sc.state_key();
        let cap = self.cfg.gate.link_capacity;
        self.links
            .entry(key.clone())
            .or_insert_with(|| SeenSet::with_capacity(cap));

        // Sets are preloaded in `new`, so the lookup always succeeds.
        let decision = self
            .links
            .get(&key)
            .map(|links| self.gate.evaluate(&item, links, &self.content))
            .unwrap_or(GateDecision::Accept);

        match decision {
            GateDecision::DuplicateLink => {
                report.duplicate_link += 1;
                return;
            }
            GateDecision::DuplicateContent { ratio } => {
                report.duplicate_content += 1;
                tracing::info!(
                    target: "pipeline",
                    source = %item.source,
                    ratio,
                    "skipping near-duplicate story"
                );
                return;
            }
            GateDecision::Accept => {}
        }
        report.accepted += 1;

        let fingerprint = normalize_fingerprint(item.comparison_text());
        let summary = summarize_with_retry(
            self.summarizer.as_ref(),
            &item,
            &sc.context,
            self.cfg.summarize.retry_attempts,
            Duration::from_secs(self.cfg.summarize.retry_delay_secs),
        )
        .await;

        let summary = match summary {
            Ok(s) => s,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    target: "pipeline",
                    source = %item.source,
                    error = %e,
                    "summarization failed; recording link only"
                );
                self.record_link(&key, &item.canonical_link);
                return;
            }
        };

        let post = compose_post(&item, &summary, &sc.tags, self.cfg.publish.max_post_chars);
        match self.publisher.publish(&post).await {
            Ok(()) => {
                report.posted += 1;
                tracing::info!(
                    target: "pipeline",
                    source = %item.source,
                    title = %item.title,
                    "posted"
                );
                self.record_link(&key, &item.canonical_link);
                self.record_content(&fingerprint);
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    target: "pipeline",
                    source = %item.source,
                    error = ?e,
                    "publish failed; recording link only"
                );
                self.record_link(&key, &item.canonical_link);
            }
        }
    }

    fn record_link(&mut self, key: &str, link: &str) {
        if let Some(set) = self.links.get_mut(key) {
            set.insert(link);
            if let Err(e) = self.store.save_links(key, set) {
                tracing::warn!(target: "pipeline", error = ?e, "failed to persist link state");
            }
        }
    }

    fn record_content(&mut self, fingerprint: &str) {
        self.content.insert(fingerprint);
        if let Err(e) = self.store.save_content(&self.content) {
            tracing::warn!(target: "pipeline", error = ?e, "failed to persist content state");
        }
    }

    // ---- Read-only accessors, mainly for tests ----

    pub fn content_set(&self) -> &SeenSet {
        &self.content
    }

    pub fn link_set(&self, state_key: &str) -> Option<&SeenSet> {
        self.links.get(state_key)
    }
}
