//! The `AdapterHandle` abstraction named in spec §9: a trait over the
//! capability set the engine needs from whatever mail source it is embedded
//! against (Outlook/COM in the source system; IMAP, JMAP, or a test double
//! in a reimplementation). The engine never mutates messages through this
//! trait and never parses MIME itself (spec §1 Non-goals) — every call
//! returns a fully-formed [`MailSnapshot`].

pub mod error;
pub mod filter;
pub mod testing;

pub use error::AdapterError;
pub use filter::{FilterExpr, FolderKind, SearchScope};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osem_core::MailSnapshot;

/// Conversation size as reported by the mail source, used by the catch-up
/// engine to decide a conversation is fully enumerated (spec §4.4 step 3a).
#[derive(Debug, Clone, Copy)]
pub struct ConversationSize {
    pub total: usize,
}

#[async_trait]
pub trait MailSourceAdapter: Send + Sync {
    /// Resolves a single message by its source-adapter identifier.
    async fn resolve_by_id(
        &self,
        entry_id: &str,
        store_id: Option<&str>,
    ) -> Result<Option<MailSnapshot>, AdapterError>;

    /// Enumerates every message the source currently associates with a
    /// conversation, seeded from a known entry-id, bounded to messages
    /// received on/after `since`. Also reports the conversation's full size
    /// so the caller can detect completeness without fetching everything.
    async fn enumerate_conversation(
        &self,
        seed_entry_id: &str,
        conversation_id: &str,
        since: DateTime<Utc>,
    ) -> Result<(Vec<MailSnapshot>, ConversationSize), AdapterError>;

    /// Restricted, per-folder query (spec §4.4 step 3b).
    async fn restrict_folder(
        &self,
        folder: FolderKind,
        filter: &FilterExpr,
    ) -> Result<Vec<MailSnapshot>, AdapterError>;

    /// An advanced/asynchronous search across `scope`; `tag` correlates the
    /// call with its eventual results for callers that fire-and-forget.
    async fn search(
        &self,
        scope: &SearchScope,
        filter: &FilterExpr,
        tag: &str,
    ) -> Result<Vec<MailSnapshot>, AdapterError>;
}
