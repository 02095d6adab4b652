use crate::config::{CatchupTuning, SEARCH_DEBOUNCE, SEARCH_LOOKBACK};
use dashmap::DashSet;
use osem_adapter::{FilterExpr, MailSourceAdapter, SearchScope};
use osem_core::MailSnapshot;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct PendingSearchItem {
    event_id: String,
    conversation_id: String,
    entry_id: String,
    attempts: u32,
    eligible_at: Instant,
}

fn item_key(event_id: &str, entry_id: &str) -> String {
    format!("{event_id}::{entry_id}")
}

/// The secondary queue of spec §4.4 "Sync-Aware Search": entry-ids the
/// primary catch-up pass couldn't resolve land here and are retried via an
/// advanced mail-source search rather than the per-folder/subject-token
/// cascade. While synchronisation is active the queue simply accumulates;
/// [`CatchupEngine`](crate::CatchupEngine) is responsible for calling
/// [`force_drain`](Self::force_drain) from its debounce and force-drain
/// timers once it isn't.
pub struct SyncAwareSearch {
    adapter: Arc<dyn MailSourceAdapter>,
    tracker: DashSet<String>,
    queue: Mutex<VecDeque<PendingSearchItem>>,
    tuning: CatchupTuning,
}

impl SyncAwareSearch {
    pub fn new(adapter: Arc<dyn MailSourceAdapter>) -> Self {
        Self::with_tuning(adapter, CatchupTuning::default())
    }

    pub fn with_tuning(adapter: Arc<dyn MailSourceAdapter>, tuning: CatchupTuning) -> Self {
        Self {
            adapter,
            tracker: DashSet::new(),
            queue: Mutex::new(VecDeque::new()),
            tuning,
        }
    }

    /// Enqueues an entry-id, gated behind [`SEARCH_DEBOUNCE`] before
    /// `force_drain` will consider it due — a freshly-missed mail is likely
    /// still mid-delivery at the source, so searching for it immediately
    /// would just waste the call.
    pub async fn enqueue(&self, event_id: String, conversation_id: String, entry_id: String) {
        let key = item_key(&event_id, &entry_id);
        if !self.tracker.insert(key) {
            return;
        }
        self.queue.lock().await.push_back(PendingSearchItem {
            event_id,
            conversation_id,
            entry_id,
            attempts: 0,
            eligible_at: Instant::now() + SEARCH_DEBOUNCE,
        });
    }

    /// Runs one debounced pass: pulls every item whose back-off has elapsed,
    /// issues a single advanced search scoped to `now - 60min` plus the
    /// queued conversation-ids, and re-enqueues anything a zero-result
    /// search didn't account for, up to [`SEARCH_MAX_RETRIES`] attempts.
    /// Returns every snapshot the search turned up so the caller can feed
    /// them back through ingestion.
    pub async fn force_drain(&self) -> Vec<MailSnapshot> {
        let now = Instant::now();
        let due = {
            let mut queue = self.queue.lock().await;
            let mut remaining = VecDeque::new();
            let mut ready = Vec::new();
            for item in queue.drain(..) {
                if item.eligible_at <= now {
                    ready.push(item);
                } else {
                    remaining.push_back(item);
                }
            }
            *queue = remaining;
            ready
        };
        if due.is_empty() {
            return Vec::new();
        }

        let since = chrono::Utc::now() - chrono::Duration::from_std(SEARCH_LOOKBACK).unwrap();
        let conversation_filter = FilterExpr::or(
            due.iter()
                .map(|item| FilterExpr::ConversationId(item.conversation_id.clone()))
                .collect(),
        );
        let filter = FilterExpr::or(vec![FilterExpr::CreatedSince(since), conversation_filter]);

        let results = self
            .adapter
            .search(&SearchScope::all_mail(), &filter, "catchup-advanced-search")
            .await
            .unwrap_or_default();
        let found_entry_ids: HashSet<String> = results.iter().map(|r| r.entry_id.to_lowercase()).collect();

        let mut requeue = Vec::new();
        for mut item in due {
            self.tracker.remove(&item_key(&item.event_id, &item.entry_id));
            if found_entry_ids.contains(&item.entry_id.to_lowercase()) {
                continue;
            }
            item.attempts += 1;
            if item.attempts < self.tuning.search_max_retries {
                item.eligible_at = Instant::now() + self.tuning.search_retry_backoff;
                requeue.push(item);
            }
        }

        if !requeue.is_empty() {
            let mut queue = self.queue.lock().await;
            for item in requeue {
                self.tracker.insert(item_key(&item.event_id, &item.entry_id));
                queue.push_back(item);
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_combines_event_and_entry_id() {
        assert_eq!(item_key("EVT-1", "A"), "EVT-1::A");
    }
}
