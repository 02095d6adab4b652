const TRIM_CHARS: &[char] = &['"', '\'', '<', '>', ';'];
const PROTOCOL_PREFIXES: &[&str] = &["SMTP:", "EX:", "MAILTO:"];

/// Normalises a participant address/name for set membership: trims
/// whitespace and `"'<>;`, strips a leading `SMTP:`/`EX:`/`MAILTO:` prefix
/// (case-insensitive), and upper-cases the result. Returns `None` if nothing
/// is left (spec §4.1: "Empty after normalisation → discard").
pub fn normalize_participant(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(TRIM_CHARS);

    let mut rest = trimmed;
    for prefix in PROTOCOL_PREFIXES {
        if rest.len() >= prefix.len() && rest.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
            rest = &rest[prefix.len()..];
            break;
        }
    }

    let rest = rest.trim().trim_matches(TRIM_CHARS);
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_smtp_prefix_and_upper_cases() {
        assert_eq!(normalize_participant("SMTP:alice@acme.com"), Some("ALICE@ACME.COM".to_string()));
    }

    #[test]
    fn strips_surrounding_punctuation() {
        assert_eq!(normalize_participant("  <bob@corp.com>; "), Some("BOB@CORP.COM".to_string()));
    }

    #[test]
    fn empty_after_trim_is_discarded() {
        assert_eq!(normalize_participant("  <>  "), None);
        assert_eq!(normalize_participant(""), None);
    }

    #[test]
    fn mailto_prefix_is_case_insensitive() {
        assert_eq!(normalize_participant("mailto:Dan@Other.com"), Some("DAN@OTHER.COM".to_string()));
    }
}
