use crate::ws::collapse_whitespace;
use regex::Regex;
use std::sync::OnceLock;

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn strip_quoted_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_html_tags(input: &str) -> String {
    html_tag_re().replace_all(input, " ").into_owned()
}

/// Produces the normalised 512-char extract used for Dice-similarity
/// comparison: quoted reply lines are dropped, HTML is stripped to text when
/// no plain-text body is available, whitespace is collapsed, and the result
/// is upper-cased and truncated to 512 characters.
pub fn body_fingerprint(body_text: Option<&str>, body_html: Option<&str>) -> String {
    let (raw, from_html) = match body_text {
        Some(text) if !text.trim().is_empty() => (text.to_string(), false),
        _ => match body_html {
            Some(html) if !html.trim().is_empty() => (html.to_string(), true),
            _ => (String::new(), false),
        },
    };

    let without_quotes = strip_quoted_lines(&raw);
    let plain = if from_html {
        strip_html_tags(&without_quotes)
    } else {
        without_quotes
    };
    let collapsed = collapse_whitespace(&plain);
    collapsed.to_uppercase().chars().take(512).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quoted_reply_lines() {
        let body = "Sounds good.\n> On Tue, Alice wrote:\n> original text";
        assert_eq!(body_fingerprint(Some(body), None), "SOUNDS GOOD.");
    }

    #[test]
    fn falls_back_to_html_when_no_text_body() {
        let html = "<p>Hello <b>World</b></p>";
        assert_eq!(body_fingerprint(None, Some(html)), "HELLO WORLD");
    }

    #[test]
    fn truncates_to_512_characters() {
        let long = "a".repeat(1000);
        let fp = body_fingerprint(Some(&long), None);
        assert_eq!(fp.chars().count(), 512);
    }

    #[test]
    fn empty_body_yields_empty_fingerprint() {
        assert_eq!(body_fingerprint(None, None), "");
        assert_eq!(body_fingerprint(Some(""), Some("")), "");
    }
}
