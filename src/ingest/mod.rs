// src/ingest/mod.rs
pub mod rss;
pub mod types;

/// Normalize fetched text for display: decode entities, strip tags, collapse
/// whitespace. Distinct from the gate's fingerprint normalization, which
/// also lowercases and drops punctuation.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Case-insensitive substring match against the configured skip list
/// (quiz/poll/opinion/sponsored filler that should never be posted).
pub fn is_skipped<S: AsRef<str>>(title: S, skip_keywords: &[String]) -> bool {
    let t = title.as_ref().to_lowercase();
    skip_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| t.contains(&k.trim().to_lowercase()))
}
