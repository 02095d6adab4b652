use crate::config::DEFERRED_RETRY_BACKOFFS;
use osem_adapter::MailSourceAdapter;
use osem_core::MailSnapshot;
use osem_store::EventStore;
use std::sync::Arc;

/// A message the live path couldn't resolve is retried on the ladder
/// `[20s, 1m, 3m, 5m]` before falling through to advanced-search recovery
/// (spec §4.4 "Deferred retry"). Each call spawns its own task rather than
/// holding state, matching the "tasks communicating via timers" idiom
/// spec §9 recommends for this subsystem.
pub struct DeferredRetryQueue {
    store: EventStore,
    adapter: Arc<dyn MailSourceAdapter>,
}

impl DeferredRetryQueue {
    pub fn new(store: EventStore, adapter: Arc<dyn MailSourceAdapter>) -> Self {
        Self { store, adapter }
    }

    /// Schedules the ladder for an already-resolved `snapshot`; returns
    /// immediately. The task stops on the first successful `try_add_mail`,
    /// or logs and gives up once the ladder is exhausted.
    pub fn schedule(&self, snapshot: MailSnapshot, preferred_event_id: Option<String>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            for backoff in DEFERRED_RETRY_BACKOFFS {
                tokio::time::sleep(*backoff).await;
                match store.try_add_mail(&snapshot, preferred_event_id.as_deref()).await {
                    Ok(Some(_)) => return,
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::warn!(target: "osem_catchup::retry", "deferred retry lookup failed: {err}");
                        continue;
                    }
                }
            }
            tracing::debug!(
                target: "osem_catchup::retry",
                "exhausted deferred-retry ladder for message {}",
                snapshot.internet_message_id
            );
        });
    }

    /// Schedules the ladder for an `entry_id` that never made it past
    /// resolution (a mail-source push hook saw a transient `AdapterError`
    /// before a snapshot ever existed): re-resolves through the adapter on
    /// each rung before handing a successful resolution to `try_add_mail`.
    pub fn schedule_resolve(&self, entry_id: String, preferred_event_id: Option<String>) {
        let store = self.store.clone();
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            for backoff in DEFERRED_RETRY_BACKOFFS {
                tokio::time::sleep(*backoff).await;
                match adapter.resolve_by_id(&entry_id, None).await {
                    Ok(Some(snapshot)) => match store.try_add_mail(&snapshot, preferred_event_id.as_deref()).await {
                        Ok(Some(_)) => return,
                        Ok(None) => continue,
                        Err(err) => {
                            tracing::warn!(target: "osem_catchup::retry", "deferred resolve-retry upsert failed for {entry_id}: {err}");
                            continue;
                        }
                    },
                    Ok(None) => continue,
                    Err(err) if err.is_transient() => continue,
                    Err(err) => {
                        tracing::debug!(target: "osem_catchup::retry", "giving up resolving {entry_id} after a permanent failure: {err}");
                        return;
                    }
                }
            }
            tracing::debug!(target: "osem_catchup::retry", "exhausted deferred-retry ladder resolving {entry_id}");
        });
    }
}
