//! Fingerprint normalization and word-overlap pre-filter.

use std::collections::HashSet;

/// Lowercase, strip punctuation, collapse whitespace to single spaces.
/// The result is the stored content fingerprint.
pub fn normalize_fingerprint(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true; // swallows leading separators
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Word set over an already-normalized fingerprint.
pub fn word_set(normalized: &str) -> HashSet<&str> {
    normalized.split(' ').filter(|w| !w.is_empty()).collect()
}

/// |intersection| / |union| over word sets. Two empty sets count as identical.
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_strips_punct_collapses_ws() {
        let out = normalize_fingerprint("  Fed raises rates -- by 50 basis points!  ");
        assert_eq!(out, "fed raises rates by 50 basis points");
    }

    #[test]
    fn normalization_of_empty_and_punct_only_is_empty() {
        assert_eq!(normalize_fingerprint(""), "");
        assert_eq!(normalize_fingerprint("?! ... --"), "");
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a = normalize_fingerprint("fed raises rates");
        let b = normalize_fingerprint("apple announces new iphone");
        assert_eq!(jaccard(&word_set(&a), &word_set(&b)), 0.0);
    }

    #[test]
    fn jaccard_of_overlapping_sets() {
        let a = normalize_fingerprint("fed raises rates by 50 basis points");
        let b = normalize_fingerprint("fed raises rates by fifty basis points");
        // 6 shared words of 8 distinct.
        let j = jaccard(&word_set(&a), &word_set(&b));
        assert!((j - 0.75).abs() < 1e-9);
    }
}
