use regex::Regex;
use std::sync::OnceLock;

fn angle_bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^<>\s]+>").unwrap())
}

/// Strips enclosing `<>` and surrounding whitespace. Message-id equality is
/// case-insensitive at the call site (spec §4.1); this only canonicalises
/// the textual form.
pub fn normalize_message_id(raw: &str) -> String {
    raw.trim().trim_start_matches('<').trim_end_matches('>').trim().to_string()
}

/// Extracts message-ids from a header value such as `References` or
/// `In-Reply-To`. Prefers `<id>` captures; if none are present, falls back to
/// splitting on whitespace, commas, and semicolons.
pub fn extract_message_ids(raw: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut found_angle = false;
    for m in angle_bracket_re().find_iter(raw) {
        found_angle = true;
        let normalized = normalize_message_id(m.as_str());
        if !normalized.is_empty() {
            ids.push(normalized);
        }
    }
    if found_angle {
        return ids;
    }

    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(normalize_message_id)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_angle_bracketed_ids() {
        let raw = "<abc123@mail.acme> <def456@mail.acme>";
        assert_eq!(extract_message_ids(raw), vec!["abc123@mail.acme", "def456@mail.acme"]);
    }

    #[test]
    fn falls_back_to_delimiter_split_without_brackets() {
        let raw = "abc123@mail.acme, def456@mail.acme";
        assert_eq!(extract_message_ids(raw), vec!["abc123@mail.acme", "def456@mail.acme"]);
    }

    #[test]
    fn normalize_strips_brackets_and_whitespace() {
        assert_eq!(normalize_message_id("  <abc123@mail.acme>  "), "abc123@mail.acme");
    }

    #[test]
    fn empty_input_yields_no_ids() {
        assert!(extract_message_ids("").is_empty());
    }
}
