//! Character-level sequence similarity: twice the total matched block
//! length over the combined length, the classic diff ratio.
//!
//! Wire stories carried by several outlets differ in a few words but share
//! long literal runs, which this measure rewards far more than word overlap
//! alone.

/// Ratio in [0.0, 1.0]; 1.0 for two empty strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_len(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total length of matching blocks: take the longest common substring, then
/// recurse on the slices to its left and to its right.
fn matching_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (ai, bi, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_len(&a[..ai], &b[..bi]) + matching_len(&a[ai + len..], &b[bi + len..])
}

/// Longest common substring via the usual two-row dynamic program.
/// Returns (start in a, start in b, length); quadratic, fine at headline scale.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0usize, 0usize, 0usize);
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best.2 {
                best = (i + 1 - curr[j + 1], j + 1 - curr[j + 1], curr[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(sequence_ratio("fed raises rates", "fed raises rates"), 1.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn syndicated_rewording_scores_high() {
        let r = sequence_ratio(
            "fed raises rates by 50 basis points",
            "fed raises rates by fifty basis points",
        );
        assert!(r > 0.85, "ratio was {r}");
    }

    #[test]
    fn different_stories_score_low() {
        let r = sequence_ratio(
            "fed raises rates by 50 basis points",
            "apple announces new iphone at fall event",
        );
        assert!(r < 0.55, "ratio was {r}");
    }

    #[test]
    fn matching_blocks_do_not_cross() {
        // "ab" + "cd" vs "cd" + "ab": one block of 2 wins, the other side
        // of it cannot match out of order.
        let r = sequence_ratio("abcd", "cdab");
        assert!((r - 0.5).abs() < 1e-9, "ratio was {r}");
    }
}
