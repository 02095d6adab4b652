use chrono::{DateTime, Utc};

/// Folders the catch-up engine restricts per-store queries to (spec §4.4
/// step 3b). Inbox queries include child folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderKind {
    Inbox,
    Sent,
    Deleted,
}

/// A DASL-style predicate over the fields spec §6 names: `ReceivedTime`,
/// `ConversationID`, `subject` (phrase-match with an optional trailing
/// wildcard), and `PR_CREATION_TIME`. A reimplementation over IMAP maps these
/// to `SEARCH` clauses, over JMAP to filter objects (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    ConversationId(String),
    ReceivedSince(DateTime<Utc>),
    CreatedSince(DateTime<Utc>),
    /// Case-insensitive phrase match against the subject; `trailing_wildcard`
    /// tolerates stored truncation of the header value.
    SubjectPhrase {
        phrase: String,
        trailing_wildcard: bool,
    },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn and(exprs: Vec<FilterExpr>) -> FilterExpr {
        FilterExpr::And(exprs)
    }

    pub fn or(exprs: Vec<FilterExpr>) -> FilterExpr {
        FilterExpr::Or(exprs)
    }
}

/// Where a `search` call should look (spec §6 `search(scope, ...)`).
#[derive(Debug, Clone)]
pub struct SearchScope {
    pub folders: Vec<FolderKind>,
}

impl SearchScope {
    pub fn all_mail() -> Self {
        Self {
            folders: vec![FolderKind::Inbox, FolderKind::Sent, FolderKind::Deleted],
        }
    }
}
