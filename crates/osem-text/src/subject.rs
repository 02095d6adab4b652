use crate::mojibake::repair_mojibake;
use crate::ws::collapse_whitespace;
use unicode_normalization::UnicodeNormalization;

/// Reply/forward prefixes stripped by [`normalize_subject`], including
/// localised variants (spec §4.1). Kept as a literal list: the source the
/// spec was distilled from resolves some entries via a resource lookup and
/// others as literals, and the spec records the resolved set as identical to
/// this literal list (spec §9 Open Questions).
pub const SUBJECT_PREFIXES: &[&str] = &[
    "RE:",
    "FW:",
    "FWD:",
    "转发:",
    "回复:",
    "回覆:",
    "轉寄:",
    "AW:",
    "SV:",
    "VS:",
    "[EXTERNAL]",
    "[EXT]",
    "[PRE-ALERT]",
];

fn matches_prefix(trimmed: &str, prefix: &str) -> bool {
    trimmed.len() >= prefix.len() && trimmed.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Strips at most one configured prefix from the front of `input`, returning
/// the remainder and whether anything was stripped.
fn strip_one_prefix(input: &str) -> (String, bool) {
    let collapsed = collapse_whitespace(input);
    for prefix in SUBJECT_PREFIXES {
        if matches_prefix(&collapsed, prefix) {
            let rest = collapsed[prefix.len()..].trim_start();
            return (rest.to_string(), true);
        }
    }
    (collapsed, false)
}

fn strip_all_prefixes(input: &str) -> (String, bool) {
    let mut current = collapse_whitespace(input);
    let mut stripped_any = false;
    loop {
        let (next, stripped) = strip_one_prefix(&current);
        if !stripped {
            break;
        }
        stripped_any = true;
        current = next;
    }
    (current, stripped_any)
}

fn looks_like_it_has_a_prefix(candidate: &str) -> bool {
    let collapsed = collapse_whitespace(candidate);
    SUBJECT_PREFIXES.iter().any(|p| matches_prefix(&collapsed, p))
}

/// Canonicalises a subject line: NFKC normalisation, whitespace collapse,
/// and repeated stripping of reply/forward prefixes. If nothing was
/// stripped, the raw text is tried for mojibake (legacy code-page
/// misinterpretation) before giving up, since a garbled "RE:" often survives
/// as unrecognisable bytes. Comparisons over the result are case-insensitive;
/// the returned string preserves display casing.
pub fn normalize_subject(subject: &str) -> String {
    let nfkc: String = subject.nfc().collect::<String>().nfkc().collect();
    let (stripped, stripped_any) = strip_all_prefixes(&nfkc);
    if stripped_any {
        return stripped.trim().to_string();
    }

    let repaired = repair_mojibake(&nfkc, looks_like_it_has_a_prefix);
    if repaired == nfkc {
        return stripped.trim().to_string();
    }
    let (repaired_stripped, _) = strip_all_prefixes(&repaired);
    repaired_stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_reply_prefix() {
        assert_eq!(normalize_subject("RE: Quote for PO-123"), "Quote for PO-123");
    }

    #[test]
    fn strips_repeated_prefixes() {
        assert_eq!(
            normalize_subject("Fwd: RE: FW: Quote for PO-123"),
            "Quote for PO-123"
        );
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_subject("Quote   for\tPO-123"), "Quote for PO-123");
    }

    #[test]
    fn leaves_subjects_without_a_prefix_untouched() {
        assert_eq!(normalize_subject("Invoice INV-9"), "Invoice INV-9");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_subject("RE: FW: Quote for PO-123");
        let twice = normalize_subject(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_localised_cjk_prefixes() {
        assert_eq!(normalize_subject("回复: 报价单"), "报价单");
    }
}
