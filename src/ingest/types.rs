// src/ingest/types.rs
use anyhow::Result;

/// One fetched unit of content considered for posting. Built fresh each
/// polling cycle and discarded after one processing pass.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    pub source: String, // e.g., "CNBC", "Hankyung"
    pub title: String,
    pub canonical_link: String, // trimmed; the strong identity key
    pub raw_body: Option<String>,
    pub published_at: Option<u64>, // unix seconds
}

impl CandidateItem {
    /// Text used for approximate duplicate detection: the body when the
    /// feed provides one, the title otherwise.
    pub fn comparison_text(&self) -> &str {
        self.raw_body.as_deref().unwrap_or(&self.title)
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// An unreachable feed is an error; an empty feed is simply no items.
    async fn fetch_latest(&self) -> Result<Vec<CandidateItem>>;
    fn name(&self) -> &str;
}
