//! Publishing collaborator: post composition + webhook publisher.
//!
//! Called only after a successful summarization. Image-card rendering is
//! deliberately absent; posts are text plus source links.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::ingest::types::CandidateItem;
use crate::summarize::Summary;

pub const ENV_WEBHOOK_URL: &str = "NEWSBOT_WEBHOOK_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub text: String,
    pub source_links: Vec<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &Post) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Build the outgoing text: headline, up to three bullet lines, disclaimer,
/// source link, then hashtags and `$ticker` tags, truncated at `max_chars`.
pub fn compose_post(
    item: &CandidateItem,
    summary: &Summary,
    tags: &str,
    max_chars: usize,
) -> Post {
    let mut text = String::new();
    text.push_str(summary.headline.trim());
    text.push('\n');
    for line in summary.body_lines.iter().take(3) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        text.push_str("• ");
        text.push_str(line);
        text.push('\n');
    }

    text.push_str("\nAI-generated summary; see source for details.\n");
    text.push('\n');
    text.push_str(item.canonical_link.trim());

    let mut tag_line = String::new();
    if !tags.trim().is_empty() {
        tag_line.push_str(tags.trim());
    }
    for t in summary.tickers.iter().take(5) {
        if !tag_line.is_empty() {
            tag_line.push(' ');
        }
        tag_line.push('$');
        tag_line.push_str(t);
    }
    if !tag_line.is_empty() {
        text.push_str("\n\n");
        text.push_str(&tag_line);
    }

    if text.chars().count() > max_chars && max_chars > 3 {
        text = text.chars().take(max_chars - 3).collect();
        text.push_str("...");
    }

    Post {
        text,
        source_links: vec![item.canonical_link.trim().to_string()],
    }
}

/// POSTs a JSON payload to a configured webhook, with timeout and bounded
/// exponential retry.
#[derive(Clone)]
pub struct WebhookPublisher {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl WebhookPublisher {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn from_env() -> Result<Self> {
        let webhook = std::env::var(ENV_WEBHOOK_URL)
            .with_context(|| format!("{ENV_WEBHOOK_URL} not set"))?;
        Ok(Self::new(webhook))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, post: &Post) -> Result<()> {
        let payload = WebhookPayload {
            content: &post.text,
        };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("webhook HTTP error: {e}"));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("webhook request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> CandidateItem {
        CandidateItem {
            source: "CNBC".to_string(),
            title: "Fed raises rates".to_string(),
            canonical_link: "https://example.test/fed".to_string(),
            raw_body: None,
            published_at: None,
        }
    }

    fn sample_summary() -> Summary {
        Summary {
            headline: "Fed raises rates by 50bp".to_string(),
            body_lines: vec![
                "Second hike this year".to_string(),
                "".to_string(),
                "Markets slipped on the news".to_string(),
                "A fourth line that is dropped".to_string(),
            ],
            tickers: vec!["^DJI".to_string(), "^GSPC".to_string()],
        }
    }

    #[test]
    fn compose_includes_headline_bullets_link_and_tags() {
        let post = compose_post(&sample_item(), &sample_summary(), "#markets #fed", 2800);
        assert!(post.text.starts_with("Fed raises rates by 50bp\n"));
        assert!(post.text.contains("• Second hike this year"));
        assert!(post.text.contains("• Markets slipped on the news"));
        assert!(!post.text.contains("fourth line"));
        assert!(post.text.contains("https://example.test/fed"));
        assert!(post.text.contains("#markets #fed $^DJI $^GSPC"));
        assert_eq!(post.source_links, vec!["https://example.test/fed".to_string()]);
    }

    #[test]
    fn compose_truncates_with_ellipsis_at_cap() {
        let post = compose_post(&sample_item(), &sample_summary(), "", 40);
        assert_eq!(post.text.chars().count(), 40);
        assert!(post.text.ends_with("..."));
    }
}
