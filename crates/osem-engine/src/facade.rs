use std::sync::Arc;
use std::time::Duration;

use osem_adapter::{AdapterError, FolderKind, MailSourceAdapter};
use osem_core::{Event, MailSnapshot};
use osem_catchup::CatchupEngine;
use osem_store::EventStore;

use crate::error::EngineError;
use crate::template_pref::TemplatePreferenceResolver;

/// The six entry points of spec §4.5, plus the mail-source push hooks spec §6
/// lists alongside the adapter (`on_new_mail`, `on_folder_item_added`,
/// `on_sync_start`/`on_sync_end`): the adapter has no concept of pushing
/// notifications back into the engine, so a host wires these to whatever
/// signal its mail source offers and calls them here. Every method logs via
/// `tracing` around its fallible call, matching `cove-email::service`.
#[derive(Clone)]
pub struct IngestionFacade {
    store: EventStore,
    adapter: Arc<dyn MailSourceAdapter>,
    catchup: Arc<CatchupEngine>,
    templates: TemplatePreferenceResolver,
}

impl IngestionFacade {
    pub fn new(
        store: EventStore,
        adapter: Arc<dyn MailSourceAdapter>,
        catchup: Arc<CatchupEngine>,
        templates: TemplatePreferenceResolver,
    ) -> Self {
        Self { store, adapter, catchup, templates }
    }

    /// Runs the matching engine and upserts into whatever it selects, if
    /// anything. An empty `conversation_id` is rejected before the store is
    /// even touched (spec §4.5).
    pub async fn try_add_mail(
        &self,
        snapshot: &MailSnapshot,
        preferred_event_id: Option<&str>,
    ) -> Result<Option<Event>, EngineError> {
        if snapshot.conversation_id.is_empty() {
            return Ok(None);
        }
        let result = self.store.try_add_mail(snapshot, preferred_event_id).await?;
        tracing::info!(
            target: "osem_engine::facade",
            entry_id = %snapshot.entry_id,
            matched = result.is_some(),
            "try_add_mail"
        );
        Ok(result)
    }

    /// Skips matching entirely and appends to `event_id`, restoring a
    /// soft-deleted member if `IsSameMail` finds one (spec §4.5).
    pub async fn add_mail_to_event(&self, event_id: &str, snapshot: &MailSnapshot) -> Result<Option<Event>, EngineError> {
        let result = self.store.add_mail_to_event(event_id, snapshot).await?;
        tracing::info!(target: "osem_engine::facade", event_id, "add_mail_to_event");
        Ok(result)
    }

    /// Creates a fresh event from `snapshot`. When `template_id` is `None`,
    /// defaults it from the template-preference resolver, trying each
    /// participant in a stable order.
    pub async fn create_event_from_mail(
        &self,
        snapshot: &MailSnapshot,
        template_id: Option<String>,
    ) -> Result<Event, EngineError> {
        let template_id = match template_id {
            Some(id) => Some(id),
            None => {
                let mut participants: Vec<String> = snapshot.participants.iter().map(|p| p.0.clone()).collect();
                participants.sort();
                self.templates.get_preferred(&participants).await
            }
        };
        let event = self.store.create_from_mail(snapshot, template_id, None).await?;
        tracing::info!(target: "osem_engine::facade", event_id = %event.event_id, "create_event_from_mail");
        Ok(event)
    }

    pub async fn remove_mail(
        &self,
        event_id: &str,
        entry_id: Option<&str>,
        message_id: Option<&str>,
    ) -> Result<Option<Event>, EngineError> {
        let event = self.store.remove_mail(event_id, entry_id, message_id).await?;
        tracing::info!(target: "osem_engine::facade", event_id, "remove_mail");
        Ok(event)
    }

    /// Enqueues catch-up for `conversation_ids`, biasing them to the front of
    /// the queue; when `immediate`, blocks until either they drain or
    /// `timeout` elapses (spec §4.5, §5 "Cancellation and timeouts").
    pub async fn trigger_catchup(
        &self,
        event_id: &str,
        conversation_ids: &[String],
        immediate: bool,
        timeout: Option<Duration>,
        full_history: bool,
    ) {
        self.catchup.trigger(event_id, conversation_ids, immediate, timeout, full_history).await;
    }

    /// Mail-source push hook: resolve each newly-delivered entry-id and run
    /// it through `try_add_mail` (spec §6 `on_new_mail`).
    pub async fn on_new_mail(&self, entry_ids: &[String]) -> Result<Vec<Event>, EngineError> {
        let mut events = Vec::new();
        for entry_id in entry_ids {
            match self.adapter.resolve_by_id(entry_id, None).await {
                Ok(Some(snapshot)) => {
                    if let Some(event) = self.try_add_mail(&snapshot, None).await? {
                        events.push(event);
                    }
                }
                Ok(None) => {
                    tracing::debug!(target: "osem_engine::facade", entry_id, "on_new_mail: adapter reported no such entry");
                }
                Err(err) => {
                    tracing::warn!(target: "osem_engine::facade", entry_id, "on_new_mail: resolve failed: {err}");
                    self.handle_resolve_failure(entry_id, &err);
                }
            }
        }
        Ok(events)
    }

    /// Mail-source push hook: a folder gained an item the host wants run
    /// through ingestion (spec §6 `on_folder_item_added`). Never propagates
    /// an `AdapterError` — the adapter's failures feed the deferred-retry
    /// queue instead (spec §7).
    pub async fn on_folder_item_added(&self, _folder: FolderKind, handle: &str) -> Result<Option<Event>, EngineError> {
        match self.adapter.resolve_by_id(handle, None).await {
            Ok(Some(snapshot)) => self.try_add_mail(&snapshot, None).await,
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!(target: "osem_engine::facade", handle, "on_folder_item_added: resolve failed: {err}");
                self.handle_resolve_failure(handle, &err);
                Ok(None)
            }
        }
    }

    /// A resolve failure has no snapshot, so it can't go through
    /// `try_add_mail`'s own error path. Transient failures (source
    /// unreachable, throttled) get a deferred-retry ladder that re-resolves
    /// the entry-id itself; permanent ones have no known event to mark
    /// not-found against, so there's nothing left to do but log.
    fn handle_resolve_failure(&self, entry_id: &str, err: &AdapterError) {
        if err.is_transient() {
            self.catchup.retry.schedule_resolve(entry_id.to_string(), None);
        } else {
            tracing::debug!(target: "osem_engine::facade", entry_id, "resolve permanently failed, nothing to mark not-found without a known event");
        }
    }

    /// Mail-source push hook: a full sync started. Suspends catch-up and
    /// pending-search draining until the matching `on_sync_end` (spec §4.4
    /// "Suspension rules").
    pub fn on_sync_start(&self) {
        self.catchup.on_sync_start();
    }

    /// Mail-source push hook: the sync that most recently called
    /// `on_sync_start` finished; resumes draining once every overlapping
    /// sync has ended.
    pub fn on_sync_end(&self) {
        self.catchup.on_sync_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use osem_adapter::testing::InMemoryAdapter;
    use osem_core::CiString;
    use std::collections::HashSet;

    fn snapshot(entry_id: &str, conversation_id: &str, subject: &str) -> MailSnapshot {
        MailSnapshot {
            entry_id: entry_id.to_string(),
            store_id: "store-1".to_string(),
            conversation_id: conversation_id.to_string(),
            internet_message_id: format!("<{entry_id}@example.com>"),
            sender: "alice@example.com".to_string(),
            to: "bob@example.com".to_string(),
            subject: subject.to_string(),
            participants: HashSet::from([CiString::new("alice@example.com"), CiString::new("bob@example.com")]),
            body_fingerprint: "fingerprint".to_string(),
            thread_index: "AQH".to_string(),
            thread_index_prefix: "AQH".to_string(),
            reference_message_ids: HashSet::new(),
            received_on: Utc::now(),
            historical_subjects: Vec::new(),
            attachments: Vec::new(),
        }
    }

    async fn facade(dir: &std::path::Path) -> (IngestionFacade, Arc<InMemoryAdapter>) {
        let store = EventStore::open(dir.join("event-store.json")).await.unwrap();
        let adapter = Arc::new(InMemoryAdapter::new());
        let catchup = CatchupEngine::new(store.clone(), adapter.clone());
        let templates = TemplatePreferenceResolver::open(dir.join("template_preferences.json")).await.unwrap();
        (IngestionFacade::new(store, adapter.clone(), catchup, templates), adapter)
    }

    #[tokio::test]
    async fn try_add_mail_rejects_an_empty_conversation_id() {
        let dir = tempfile::tempdir().unwrap();
        let (facade, _adapter) = facade(dir.path()).await;
        let result = facade.try_add_mail(&snapshot("E1", "", "Hello"), None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_event_from_mail_defaults_template_from_preference_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let (facade, _adapter) = facade(dir.path()).await;
        facade.templates.set_preferred("alice@example.com", "tmpl-sales").await.unwrap();

        let event = facade.create_event_from_mail(&snapshot("E1", "C1", "Quote request"), None).await.unwrap();
        assert_eq!(event.template_id.as_deref(), Some("tmpl-sales"));
    }

    #[tokio::test]
    async fn on_new_mail_resolves_through_the_adapter_and_ingests() {
        let dir = tempfile::tempdir().unwrap();
        let (facade, adapter) = facade(dir.path()).await;
        adapter.seed(snapshot("E1", "C1", "Quote request"));

        let events = facade.on_new_mail(&["E1".to_string()]).await.unwrap();
        assert!(events.is_empty(), "first mail in a conversation has no event to match into");

        let created = facade.create_event_from_mail(&snapshot("E1", "C1", "Quote request"), None).await.unwrap();
        assert_eq!(created.emails.len(), 1);
    }
}
