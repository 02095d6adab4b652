use crate::mojibake::repair_mojibake;
use regex::Regex;
use std::sync::OnceLock;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(Subject|主题|主旨|標題|제목|件名)\s*[:：]\s*(.*)$").unwrap())
}

fn scan(body: &str) -> Vec<String> {
    let mut results = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut lines = body.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = header_re().captures(line) else {
            continue;
        };
        let mut value = caps[2].trim().to_string();
        while let Some(next) = lines.peek() {
            if next.starts_with(' ') || next.starts_with('\t') {
                let continuation = next.trim();
                if !continuation.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(continuation);
                }
                lines.next();
            } else {
                break;
            }
        }
        let trimmed = value.trim().to_string();
        if !trimmed.is_empty() && seen.insert(trimmed.clone()) {
            results.push(trimmed);
        }
    }
    results
}

/// Mines subject lines out of quoted reply headers in the body (e.g. a
/// previous "Subject: ..." line carried along in the quoted section). Falls
/// back to one mojibake-repair attempt when nothing matches on the raw body.
pub fn extract_historical_subjects(body: &str) -> Vec<String> {
    let direct = scan(body);
    if !direct.is_empty() {
        return direct;
    }
    let repaired = repair_mojibake(body, |candidate| !scan(candidate).is_empty());
    scan(&repaired)
}
