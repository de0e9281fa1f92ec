//! Summarization collaborator: provider trait + Gemini-backed client.
//!
//! Called only after the dedup gate accepts an item. Rate-limit responses
//! are surfaced as their own error kind so the caller can apply a small,
//! fixed-delay retry; everything else fails fast.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::types::CandidateItem;

/// Generated output for one accepted item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub headline: String,
    pub body_lines: Vec<String>,
    pub tickers: Vec<String>,
}

#[derive(Debug)]
pub enum SummarizeError {
    /// HTTP 429 from the provider; retryable with back-off.
    RateLimited,
    /// Anything else: transport error, non-2xx status, malformed reply.
    Api(anyhow::Error),
}

impl fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeError::RateLimited => write!(f, "summarization rate limited"),
            SummarizeError::Api(e) => write!(f, "summarization failed: {e:#}"),
        }
    }
}

impl std::error::Error for SummarizeError {}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `context` is the per-source label fed into the prompt (e.g. "US").
    async fn summarize(
        &self,
        item: &CandidateItem,
        context: &str,
    ) -> Result<Summary, SummarizeError>;
    fn name(&self) -> &'static str;
}

/// Retry wrapper: rate-limit failures get up to `attempts` tries with a
/// fixed delay between them; every other error returns immediately.
pub async fn summarize_with_retry(
    summarizer: &dyn Summarizer,
    item: &CandidateItem,
    context: &str,
    attempts: u32,
    delay: Duration,
) -> Result<Summary, SummarizeError> {
    let attempts = attempts.max(1);
    let mut tries = 0u32;
    loop {
        tries += 1;
        match summarizer.summarize(item, context).await {
            Err(SummarizeError::RateLimited) if tries < attempts => {
                tracing::warn!(
                    target: "summarize",
                    provider = summarizer.name(),
                    tries,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

/// Client for the generative-language `generateContent` endpoint.
/// Requires `GEMINI_API_KEY`.
pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn from_env(model: &str) -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        let http = reqwest::Client::builder()
            .user_agent("market-news-bot/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }

    fn build_prompt(item: &CandidateItem, context: &str) -> String {
        let body = item.raw_body.as_deref().unwrap_or_default();
        format!(
            "Summarize the following {context} market news for retail investors.\n\
             \n\
             Title: {title}\n\
             Body: {body}\n\
             \n\
             Rules:\n\
             - one short headline\n\
             - two or three bullet points with the investor-relevant facts\n\
             - extract up to 5 related tickers (e.g. AAPL, ^DJI, BTC-USD)\n\
             - reply with JSON only\n\
             \n\
             JSON: {{\"headline\":\"...\",\"points\":[\"...\"],\"tickers\":[\"AAPL\"]}}",
            context = context,
            title = item.title,
            body = body,
        )
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(
        &self,
        item: &CandidateItem,
        context: &str,
    ) -> Result<Summary, SummarizeError> {
        let req = GenRequest {
            contents: vec![GenContent {
                parts: vec![GenPart {
                    text: Self::build_prompt(item, context),
                }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .map_err(|e| SummarizeError::Api(anyhow!(e).context("gemini request failed")))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizeError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(SummarizeError::Api(anyhow!(
                "gemini http status {}",
                resp.status()
            )));
        }

        let body: GenResponse = resp
            .json()
            .await
            .map_err(|e| SummarizeError::Api(anyhow!(e).context("decoding gemini response")))?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or("");

        extract_summary_json(text)
            .ok_or_else(|| SummarizeError::Api(anyhow!("malformed summarizer reply")))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ---- Wire types for generateContent ----

#[derive(Serialize)]
struct GenRequest {
    contents: Vec<GenContent>,
}
#[derive(Serialize)]
struct GenContent {
    parts: Vec<GenPart>,
}
#[derive(Serialize)]
struct GenPart {
    text: String,
}

#[derive(Deserialize)]
struct GenResponse {
    #[serde(default)]
    candidates: Vec<GenCandidate>,
}
#[derive(Deserialize)]
struct GenCandidate {
    content: GenRespContent,
}
#[derive(Deserialize)]
struct GenRespContent {
    #[serde(default)]
    parts: Vec<GenRespPart>,
}
#[derive(Deserialize)]
struct GenRespPart {
    text: String,
}

/// Pull the first JSON object out of a model reply and scrub control
/// characters before parsing. Models wrap the object in prose or code
/// fences often enough that strict parsing of the whole reply fails.
pub fn extract_summary_json(reply: &str) -> Option<Summary> {
    static RE_OBJ: OnceCell<Regex> = OnceCell::new();
    let re = RE_OBJ.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap());
    let m = re.find(reply)?;
    let cleaned: String = m
        .as_str()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    #[derive(Deserialize)]
    struct Raw {
        headline: String,
        #[serde(default)]
        points: Vec<String>,
        #[serde(default)]
        tickers: Vec<String>,
    }

    let raw: Raw = serde_json::from_str(&cleaned).ok()?;
    let headline = raw.headline.trim().to_string();
    if headline.is_empty() {
        return None;
    }
    let body_lines: Vec<String> = raw
        .points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let tickers: Vec<String> = raw
        .tickers
        .into_iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .take(5)
        .collect();

    Some(Summary {
        headline,
        body_lines,
        tickers,
    })
}

/// Deterministic double for tests and local dry runs.
#[derive(Clone)]
pub struct MockSummarizer {
    pub fixed: Summary,
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        _item: &CandidateItem,
        _context: &str,
    ) -> Result<Summary, SummarizeError> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
