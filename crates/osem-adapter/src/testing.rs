//! An in-memory [`MailSourceAdapter`] test double. Every engine crate's
//! integration tests depend on this rather than a real mail source.

use crate::{AdapterError, ConversationSize, FilterExpr, FolderKind, MailSourceAdapter, SearchScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osem_core::MailSnapshot;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryAdapter {
    messages: Mutex<Vec<MailSnapshot>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, snapshot: MailSnapshot) {
        self.messages.lock().unwrap().push(snapshot);
    }

    fn snapshot_matches_subject(snapshot: &MailSnapshot, phrase: &str, trailing_wildcard: bool) -> bool {
        let subject = snapshot.subject.to_lowercase();
        let phrase = phrase.to_lowercase();
        if trailing_wildcard {
            subject.contains(phrase.trim_end_matches('*'))
        } else {
            subject.contains(&phrase)
        }
    }

    fn snapshot_matches(snapshot: &MailSnapshot, filter: &FilterExpr) -> bool {
        match filter {
            FilterExpr::ConversationId(id) => snapshot.conversation_id.eq_ignore_ascii_case(id),
            FilterExpr::ReceivedSince(since) => snapshot.received_on >= *since,
            FilterExpr::CreatedSince(since) => snapshot.received_on >= *since,
            FilterExpr::SubjectPhrase { phrase, trailing_wildcard } => {
                Self::snapshot_matches_subject(snapshot, phrase, *trailing_wildcard)
            }
            FilterExpr::And(exprs) => exprs.iter().all(|e| Self::snapshot_matches(snapshot, e)),
            FilterExpr::Or(exprs) => exprs.iter().any(|e| Self::snapshot_matches(snapshot, e)),
        }
    }
}

#[async_trait]
impl MailSourceAdapter for InMemoryAdapter {
    async fn resolve_by_id(
        &self,
        entry_id: &str,
        _store_id: Option<&str>,
    ) -> Result<Option<MailSnapshot>, AdapterError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.entry_id.eq_ignore_ascii_case(entry_id))
            .cloned())
    }

    async fn enumerate_conversation(
        &self,
        _seed_entry_id: &str,
        conversation_id: &str,
        since: DateTime<Utc>,
    ) -> Result<(Vec<MailSnapshot>, ConversationSize), AdapterError> {
        let messages = self.messages.lock().unwrap();
        let matches: Vec<MailSnapshot> = messages
            .iter()
            .filter(|m| m.conversation_id.eq_ignore_ascii_case(conversation_id) && m.received_on >= since)
            .cloned()
            .collect();
        let total = messages
            .iter()
            .filter(|m| m.conversation_id.eq_ignore_ascii_case(conversation_id))
            .count();
        Ok((matches, ConversationSize { total }))
    }

    async fn restrict_folder(
        &self,
        _folder: FolderKind,
        filter: &FilterExpr,
    ) -> Result<Vec<MailSnapshot>, AdapterError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| Self::snapshot_matches(m, filter))
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        _scope: &SearchScope,
        filter: &FilterExpr,
        _tag: &str,
    ) -> Result<Vec<MailSnapshot>, AdapterError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| Self::snapshot_matches(m, filter))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn snapshot(entry_id: &str, conversation_id: &str, subject: &str) -> MailSnapshot {
        MailSnapshot {
            entry_id: entry_id.into(),
            store_id: "S".into(),
            conversation_id: conversation_id.into(),
            internet_message_id: String::new(),
            sender: "alice@acme".into(),
            to: String::new(),
            subject: subject.into(),
            participants: HashSet::new(),
            body_fingerprint: String::new(),
            thread_index: String::new(),
            thread_index_prefix: String::new(),
            reference_message_ids: HashSet::new(),
            received_on: Utc::now(),
            historical_subjects: vec![],
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn resolve_by_id_finds_seeded_message() {
        let adapter = InMemoryAdapter::new();
        adapter.seed(snapshot("A", "C1", "Quote for PO-123"));
        let found = adapter.resolve_by_id("a", None).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn enumerate_conversation_reports_total_size() {
        let adapter = InMemoryAdapter::new();
        adapter.seed(snapshot("A", "C1", "Quote for PO-123"));
        adapter.seed(snapshot("B", "C1", "RE: Quote for PO-123"));
        let (found, size) = adapter
            .enumerate_conversation("A", "C1", Utc::now() - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(size.total, 2);
    }
}
