use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{CandidateItem, FeedSource};
use crate::ingest::{is_skipped, normalize_text};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// Generic RSS 2.0 feed. HTTP mode for production, fixture mode for tests.
pub struct RssFeed {
    source: String,
    limit: usize,
    skip_keywords: Vec<String>,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssFeed {
    pub fn from_url(source: &str, url: &str) -> Self {
        Self {
            source: source.to_string(),
            limit: 20,
            skip_keywords: Vec::new(),
            mode: Mode::Http {
                url: url.to_string(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_fixture(source: &str, xml: &str) -> Self {
        Self {
            source: source.to_string(),
            limit: 20,
            skip_keywords: Vec::new(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_skip_keywords(mut self, skip_keywords: Vec<String>) -> Self {
        self.skip_keywords = skip_keywords;
        self
    }

    fn parse_items(&self, s: &str) -> Result<Vec<CandidateItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing rss xml for {}", self.source))?;

        let mut out = Vec::new();
        for it in rss.channel.item {
            if out.len() >= self.limit {
                break;
            }
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let link = it.link.as_deref().unwrap_or_default().trim().to_string();
            if title.is_empty() || link.is_empty() {
                continue;
            }
            if is_skipped(&title, &self.skip_keywords) {
                continue;
            }
            let body = it
                .description
                .map(|d| normalize_text(&d))
                .filter(|d| !d.is_empty());

            out.push(CandidateItem {
                source: self.source.clone(),
                title,
                canonical_link: link,
                raw_body: body,
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_latest(&self) -> Result<Vec<CandidateItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.source))?;
                let resp = resp
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.source))?;
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.source))?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.source
    }
}

/// Feeds routinely carry HTML entities that are not valid XML; replace the
/// common ones before handing the document to the XML parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
