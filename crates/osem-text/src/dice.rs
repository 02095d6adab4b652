use std::collections::HashMap;

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 {
        return Vec::new();
    }
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Dice coefficient over character bigrams: `2*|B(a) ∩ B(b)| / (|B(a)|+|B(b)|)`,
/// using multiset intersection so repeated bigrams are not over-counted.
/// Symmetric and bounded in `[0, 1]`.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    let bigrams_a = bigrams(a);
    let bigrams_b = bigrams(b);
    if bigrams_a.is_empty() || bigrams_b.is_empty() {
        return 0.0;
    }

    let mut counts_a: HashMap<(char, char), usize> = HashMap::new();
    for bg in &bigrams_a {
        *counts_a.entry(*bg).or_insert(0) += 1;
    }
    let mut counts_b: HashMap<(char, char), usize> = HashMap::new();
    for bg in &bigrams_b {
        *counts_b.entry(*bg).or_insert(0) += 1;
    }

    let overlap: usize = counts_a
        .iter()
        .map(|(bg, count_a)| counts_b.get(bg).map_or(0, |count_b| (*count_a).min(*count_b)))
        .sum();

    (2.0 * overlap as f64) / (bigrams_a.len() + bigrams_b.len()) as f64
}

/// 256-char-prefix baseline check: either fingerprint is a prefix of the
/// other within the first 256 characters, or their shared prefix up to the
/// shorter length is equal.
pub fn matches_baseline(a: &str, b: &str) -> bool {
    let ca: String = a.chars().take(256).collect();
    let cb: String = b.chars().take(256).collect();
    if ca.starts_with(&cb) || cb.starts_with(&ca) {
        return true;
    }
    let min_len = ca.chars().count().min(cb.chars().count());
    let pa: String = ca.chars().take(min_len).collect();
    let pb: String = cb.chars().take(min_len).collect();
    pa == pb
}

/// Two fingerprints are "similar" (spec §4.1) when their Dice coefficient is
/// at least 0.7 or they agree on the 256-char baseline.
pub fn fingerprints_similar(a: &str, b: &str) -> bool {
    dice_similarity(a, b) >= 0.7 || matches_baseline(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_fully_similar() {
        assert_eq!(dice_similarity("HELLO WORLD", "HELLO WORLD"), 1.0);
    }

    #[test]
    fn is_symmetric() {
        assert_eq!(dice_similarity("NIGHT", "NACHT"), dice_similarity("NACHT", "NIGHT"));
    }

    #[test]
    fn is_bounded_in_unit_interval() {
        let sim = dice_similarity("QUOTE FOR PO-123", "INVOICE INV-9");
        assert!((0.0..=1.0).contains(&sim));
    }

    #[test]
    fn empty_strings_have_zero_similarity() {
        assert_eq!(dice_similarity("", ""), 0.0);
    }

    #[test]
    fn baseline_matches_on_shared_prefix() {
        assert!(matches_baseline("QUOTE FOR PO-123 DETAILS", "QUOTE FOR PO-123"));
    }
}
