use osem_text::normalize_subject;

/// Minimum length an incoming subject must have before it is allowed to
/// truncated-match a longer stored subject (spec §4.3: "A mail whose subject
/// is a 3-char prefix of a stored subject must *not* truncated-match").
pub const TRUNCATED_MATCH_MIN_LEN: usize = 4;

/// `A` equals `B` case-insensitively after normalisation, or `A` starts with
/// `B` (case-insensitive). Used when the *stored* candidate subject may
/// itself be the earlier-truncated form and the incoming subject is the
/// fuller one.
pub fn standard_match(a: &str, b: &str) -> bool {
    let na = normalize_subject(a).to_lowercase();
    let nb = normalize_subject(b).to_lowercase();
    if na == nb {
        return true;
    }
    !nb.is_empty() && na.starts_with(&nb)
}

/// `|A| >= 4` and `B` starts with `A` (case-insensitive): the stored
/// candidate is the longer form, and `A` is a truncated header value.
pub fn truncated_match(a: &str, b: &str) -> bool {
    let na = normalize_subject(a);
    let nb = normalize_subject(b).to_lowercase();
    let na_lower = na.to_lowercase();
    na.chars().count() >= TRUNCATED_MATCH_MIN_LEN && !nb.is_empty() && nb.starts_with(&na_lower)
}
