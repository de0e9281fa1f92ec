// tests/gate_decisions.rs
// The decision procedure from the gate's contract: exact link first,
// Jaccard pre-filter next, sequence ratio last, short texts exempt.

use market_news_bot::dedup::fingerprint::normalize_fingerprint;
use market_news_bot::dedup::{DedupGate, GateConfig, GateDecision};
use market_news_bot::ingest::types::CandidateItem;
use market_news_bot::store::SeenSet;

fn item(link: &str, title: &str) -> CandidateItem {
    CandidateItem {
        source: "Wire".to_string(),
        title: title.to_string(),
        canonical_link: link.to_string(),
        raw_body: None,
        published_at: None,
    }
}

fn content_with(texts: &[&str]) -> SeenSet {
    let mut set = SeenSet::with_capacity(100);
    for t in texts {
        set.insert(&normalize_fingerprint(t));
    }
    set
}

#[test]
fn exact_link_wins_over_content_similarity() {
    let gate = DedupGate::default();
    let mut links = SeenSet::with_capacity(100);
    links.insert("https://example.test/story");
    // Content is an exact duplicate too; the decision must still be the
    // cheap link rejection.
    let content = content_with(&["Fed raises rates by 50 basis points"]);

    let it = item("https://example.test/story", "Fed raises rates by 50 basis points");
    assert_eq!(gate.evaluate(&it, &links, &content), GateDecision::DuplicateLink);
}

#[test]
fn syndicated_story_with_fresh_link_is_rejected_on_content() {
    let gate = DedupGate::default();
    let links = SeenSet::with_capacity(100);
    let content = content_with(&["Fed raises rates by 50 basis points"]);

    let it = item(
        "https://other-outlet.test/markets/fed",
        "fed raises rates by fifty basis points",
    );
    match gate.evaluate(&it, &links, &content) {
        GateDecision::DuplicateContent { ratio } => {
            assert!(ratio >= 0.6, "ratio was {ratio}");
        }
        other => panic!("expected content rejection, got {other:?}"),
    }
}

#[test]
fn same_topic_different_wording_passes() {
    let gate = DedupGate::default();
    let links = SeenSet::with_capacity(100);
    let content = content_with(&["Fed lifts benchmark rate, citing sticky inflation data"]);

    let it = item(
        "https://example.test/b",
        "Central bank tightens policy again as prices stay hot",
    );
    assert!(gate.evaluate(&it, &links, &content).is_accept());
}

#[test]
fn unrelated_story_passes_the_prefilter_cheaply() {
    let gate = DedupGate::default();
    let links = SeenSet::with_capacity(100);
    let content = content_with(&["Fed raises rates"]);

    let it = item("https://example.test/c", "Apple announces new iPhone");
    assert!(gate.evaluate(&it, &links, &content).is_accept());
}

#[test]
fn short_titles_only_reject_via_link() {
    let gate = DedupGate::default();
    let mut links = SeenSet::with_capacity(100);
    links.insert("https://example.test/short");
    let content = content_with(&["fed cut", "big news"]);

    // identical short content, new link: accept
    let fresh = item("https://example.test/new", "Fed cut");
    assert!(gate.evaluate(&fresh, &links, &content).is_accept());

    // seen link, short content: still a link rejection
    let seen = item("https://example.test/short", "Fed cut");
    assert_eq!(gate.evaluate(&seen, &links, &content), GateDecision::DuplicateLink);
}

#[test]
fn thresholds_come_from_config_not_constants() {
    // A permissive threshold accepts what the default would reject.
    let lax = DedupGate::new(GateConfig {
        jaccard_prefilter: 0.4,
        sequence_threshold: 0.95,
        min_fingerprint_words: 3,
    });
    let links = SeenSet::with_capacity(100);
    let content = content_with(&["Fed raises rates by 50 basis points"]);

    let it = item(
        "https://example.test/d",
        "fed raises rates by fifty basis points",
    );
    assert!(lax.evaluate(&it, &links, &content).is_accept());

    let strict = DedupGate::new(GateConfig {
        sequence_threshold: 0.55,
        ..GateConfig::default()
    });
    assert!(!strict.evaluate(&it, &links, &content).is_accept());
}

#[test]
fn newest_fingerprints_are_scanned_first() {
    // Not observable through the decision alone, but the ratio reported
    // must come from the matching (recent) entry even when an older entry
    // would also match.
    let gate = DedupGate::default();
    let links = SeenSet::with_capacity(100);
    let content = content_with(&[
        "fed raises rates by fifty basis points",
        "fed raises rates by 50 basis points",
    ]);

    let it = item("https://example.test/e", "Fed raises rates by 50 basis points");
    match gate.evaluate(&it, &links, &content) {
        GateDecision::DuplicateContent { ratio } => {
            // newest entry is the exact normalized match
            assert_eq!(ratio, 1.0);
        }
        other => panic!("expected content rejection, got {other:?}"),
    }
}
