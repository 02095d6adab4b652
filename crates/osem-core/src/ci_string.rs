use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A string compared and hashed case-insensitively while preserving the
/// original casing for display and serialization.
///
/// Several `Event` fields are specified as "case-insensitive" sets
/// (`related_subjects`, `participants`, `not_found_message_ids`,
/// `processed_message_ids`); storing `HashSet<CiString>` gives the right
/// equality/hash semantics without losing the display form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CiString(pub String);

impl CiString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl PartialEq for CiString {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0) || self.0.to_lowercase() == other.0.to_lowercase()
    }
}
impl Eq for CiString {}

impl Hash for CiString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_lowercase().hash(state)
    }
}

impl fmt::Display for CiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CiString {
    fn from(s: String) -> Self {
        Self(s)
    }
}
impl From<&str> for CiString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
impl Borrow<str> for CiString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_case_insensitive() {
        assert_eq!(CiString::new("Alice@Acme"), CiString::new("ALICE@acme"));
        assert_ne!(CiString::new("Alice"), CiString::new("Bob"));
    }

    #[test]
    fn set_dedupes_case_variants() {
        let mut set: HashSet<CiString> = HashSet::new();
        set.insert(CiString::new("ALICE@ACME"));
        set.insert(CiString::new("alice@acme"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_preserves_original_casing() {
        let s = CiString::new("Bob@Corp");
        assert_eq!(format!("{s}"), "Bob@Corp");
    }
}
