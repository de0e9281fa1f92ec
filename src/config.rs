// src/config.rs
//! Bot configuration: one TOML file plus environment-only secrets.
//!
//! Thresholds and capacities are deliberately configuration, not constants:
//! deployments have run with link caps of 300 and 2000 and sequence
//! thresholds of 0.55 and 0.6, and both must stay expressible.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dedup::GateConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/bot.toml";
pub const ENV_CONFIG_PATH: &str = "NEWSBOT_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub gate: GateSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub summarize: SummarizeSection,
    #[serde(default)]
    pub publish: PublishSection,
    #[serde(default)]
    pub skip_keywords: Vec<String>,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

impl BotConfig {
    /// Load from `$NEWSBOT_CONFIG_PATH` or the default path.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        let cfg: BotConfig = toml::from_str(&content)
            .with_context(|| format!("parsing bot config {}", path.display()))?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GateSection {
    pub jaccard_prefilter: f64,
    pub sequence_threshold: f64,
    pub min_fingerprint_words: usize,
    pub link_capacity: usize,
    pub content_capacity: usize,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            jaccard_prefilter: 0.4,
            sequence_threshold: 0.6,
            min_fingerprint_words: 3,
            link_capacity: 2000,
            content_capacity: 2000,
        }
    }
}

impl GateSection {
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            jaccard_prefilter: self.jaccard_prefilter,
            sequence_threshold: self.sequence_threshold,
            min_fingerprint_words: self.min_fingerprint_words,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub state_dir: PathBuf,
    pub max_posts_per_run: usize,
    /// When set, the binary loops on this interval instead of running once.
    pub poll_interval_secs: Option<u64>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("state"),
            max_posts_per_run: 4,
            poll_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizeSection {
    pub model: String,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for SummarizeSection {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            retry_attempts: 3,
            retry_delay_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    pub max_post_chars: usize,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            max_post_chars: 2800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Key for the per-source seen-link file; derived from `name` if absent.
    #[serde(default)]
    pub state_key: Option<String>,
    /// Label fed into the summarization prompt, e.g. "US" or "Korean".
    #[serde(default)]
    pub context: String,
    /// Hashtags appended to every post from this source.
    #[serde(default)]
    pub tags: String,
    #[serde(default = "default_source_limit")]
    pub limit: usize,
}

fn default_source_limit() -> usize {
    8
}

impl SourceConfig {
    pub fn state_key(&self) -> String {
        match &self.state_key {
            Some(k) if !k.trim().is_empty() => k.trim().to_string(),
            _ => slugify(&self.name),
        }
    }
}

/// Lowercased alphanumerics with runs of everything else collapsed to a
/// single underscore; used for state file names.
fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("source");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const SAMPLE: &str = r##"
skip_keywords = ["quiz", "sponsored"]

[gate]
sequence_threshold = 0.55
link_capacity = 300

[run]
state_dir = "state"
max_posts_per_run = 2

[[source]]
name = "US stocks (CNBC)"
url = "https://example.test/cnbc.xml"
context = "US"
tags = "#stocks #nasdaq"

[[source]]
name = "KR stocks"
url = "https://example.test/kr.xml"
state_key = "kr"
limit = 4
"##;

    #[test]
    fn sample_config_parses_with_defaults_filled() {
        let cfg: BotConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.gate.sequence_threshold, 0.55);
        assert_eq!(cfg.gate.link_capacity, 300);
        // untouched fields keep their defaults
        assert_eq!(cfg.gate.jaccard_prefilter, 0.4);
        assert_eq!(cfg.gate.content_capacity, 2000);
        assert_eq!(cfg.run.max_posts_per_run, 2);
        assert_eq!(cfg.summarize.retry_attempts, 3);
        assert_eq!(cfg.publish.max_post_chars, 2800);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].limit, 8);
        assert_eq!(cfg.sources[1].limit, 4);
    }

    #[test]
    fn state_key_uses_override_or_slug() {
        let cfg: BotConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.sources[0].state_key(), "us_stocks_cnbc");
        assert_eq!(cfg.sources[1].state_key(), "kr");
    }

    #[test]
    fn slugify_handles_edge_cases() {
        assert_eq!(slugify("US stocks (CNBC)"), "us_stocks_cnbc");
        assert_eq!(slugify("???"), "source");
        assert_eq!(slugify("  a  b  "), "a_b");
    }

    #[serial_test::serial]
    #[test]
    fn env_var_overrides_config_path() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("bot.toml");
        fs::write(&p, SAMPLE).unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = BotConfig::load_default().unwrap();
        assert_eq!(cfg.sources.len(), 2);
        env::remove_var(ENV_CONFIG_PATH);
    }
}
