// src/dedup/mod.rs
//! Deduplication gate: decides whether a fetched candidate is new enough to
//! spend a summarization call and a publish action on.
//!
//! Three checks, in order, short-circuiting on the first hit:
//! 1. exact trimmed-link match against the per-source seen-link set — the
//!    cheapest check, always first;
//! 2. approximate content match against the global fingerprint set, newest
//!    first: a cheap Jaccard word-overlap pre-filter, then a character-level
//!    matching-blocks ratio for pairs that pass it;
//! 3. otherwise accept.
//!
//! Recording accepted items back into the sets is the caller's job, because
//! what gets recorded depends on how the downstream calls went (see
//! `pipeline`).

pub mod fingerprint;
pub mod similarity;

use crate::ingest::types::CandidateItem;
use crate::store::SeenSet;

use fingerprint::{jaccard, normalize_fingerprint, word_set};
use similarity::sequence_ratio;

/// Tunable thresholds. Deployments have run with a sequence threshold
/// anywhere between 0.55 and 0.6; treat these as configuration.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    /// Word-overlap floor below which the expensive ratio is skipped.
    pub jaccard_prefilter: f64,
    /// Matching-blocks ratio at or above which content counts as duplicate.
    pub sequence_threshold: f64,
    /// Fingerprints with fewer words than this carry too little signal and
    /// never reject on content grounds.
    pub min_fingerprint_words: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            jaccard_prefilter: 0.4,
            sequence_threshold: 0.6,
            min_fingerprint_words: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accept,
    /// The trimmed canonical link was already recorded for this source.
    DuplicateLink,
    /// A recorded fingerprint matched above the sequence threshold.
    DuplicateContent { ratio: f64 },
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DedupGate {
    cfg: GateConfig,
}

impl DedupGate {
    pub fn new(cfg: GateConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &GateConfig {
        &self.cfg
    }

    /// Decide ACCEPT or REJECT for one candidate against the per-source link
    /// set and the global content set.
    pub fn evaluate(
        &self,
        item: &CandidateItem,
        links: &SeenSet,
        content: &SeenSet,
    ) -> GateDecision {
        let link = item.canonical_link.trim();
        if links.contains(link) {
            tracing::debug!(target: "dedup", id = %anon_hash(link), "duplicate link");
            return GateDecision::DuplicateLink;
        }

        let norm = normalize_fingerprint(item.comparison_text());
        let words = word_set(&norm);
        if words.len() < self.cfg.min_fingerprint_words {
            // Too little text to compare; only the link check applies.
            return GateDecision::Accept;
        }

        for seen in content.iter_newest_first() {
            let seen_words = word_set(seen);
            if jaccard(&words, &seen_words) < self.cfg.jaccard_prefilter {
                continue;
            }
            let ratio = sequence_ratio(&norm, seen);
            if ratio >= self.cfg.sequence_threshold {
                tracing::info!(
                    target: "dedup",
                    id = %anon_hash(&norm),
                    ratio,
                    "near-duplicate content"
                );
                return GateDecision::DuplicateContent { ratio };
            }
        }

        GateDecision::Accept
    }
}

/// Short hex digest for log lines; raw candidate text stays out of logs.
fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
