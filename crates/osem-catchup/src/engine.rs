use crate::config::{
    CatchupTuning, EARLIEST_EXTENSION_HOURS, FULL_HISTORY_LOOKBACK_DAYS, MAX_SUBJECT_TOKENS,
    NORMAL_LOOKBACK_DAYS, WILDCARD_TOKEN_THRESHOLD,
};
use crate::request::{tracker_key, CatchupRequest};
use crate::retry::DeferredRetryQueue;
use crate::search::SyncAwareSearch;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashSet;
use osem_adapter::{FilterExpr, FolderKind, MailSourceAdapter, SearchScope};
use osem_core::{Event, MailSnapshot};
use osem_match::{body_fingerprint_matches, conversation_id_matches, reference_message_id_matches, thread_root_matches};
use osem_store::EventStore;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Retroactively pulls missing mail for known events: late delivery,
/// indexing lag, mail delivered to an unwatched folder, and historical
/// backfill on first association (spec §4.4).
pub struct CatchupEngine {
    store: EventStore,
    adapter: Arc<dyn MailSourceAdapter>,
    queue: Mutex<VecDeque<CatchupRequest>>,
    tracker: DashSet<String>,
    drain_permit: Semaphore,
    sync_depth: AtomicI64,
    tuning: CatchupTuning,
    pub search: SyncAwareSearch,
    pub retry: DeferredRetryQueue,
}

impl CatchupEngine {
    pub fn new(store: EventStore, adapter: Arc<dyn MailSourceAdapter>) -> Arc<Self> {
        Self::with_tuning(store, adapter, CatchupTuning::default())
    }

    pub fn with_tuning(store: EventStore, adapter: Arc<dyn MailSourceAdapter>, tuning: CatchupTuning) -> Arc<Self> {
        Arc::new(Self {
            store: store.clone(),
            adapter: adapter.clone(),
            queue: Mutex::new(VecDeque::new()),
            tracker: DashSet::new(),
            drain_permit: Semaphore::new(1),
            sync_depth: AtomicI64::new(0),
            tuning,
            retry: DeferredRetryQueue::new(store, adapter.clone()),
            search: SyncAwareSearch::with_tuning(adapter, tuning),
        })
    }

    pub fn is_paused_by_sync(&self) -> bool {
        self.sync_depth.load(Ordering::SeqCst) > 0
    }

    /// `SyncStart` — increments the suspension counter (spec §4.4
    /// "Suspension rules").
    pub fn on_sync_start(&self) {
        self.sync_depth.fetch_add(1, Ordering::SeqCst);
    }

    /// `SyncEnd` — decrements the counter; once it returns to zero, resumes
    /// the pending catch-up queue and force-drains the pending-search queue.
    pub fn on_sync_end(self: &Arc<Self>) {
        let depth = self.sync_depth.fetch_sub(1, Ordering::SeqCst) - 1;
        if depth > 0 {
            return;
        }
        self.sync_depth.fetch_max(0, Ordering::SeqCst);
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.drain(engine.tuning.drain_batch_size).await;
            let recovered = engine.search.force_drain().await;
            engine.ingest_recovered(recovered).await;
        });
    }

    /// Routes mail Sync-Aware Search turned up back through ingestion (spec
    /// §4.4 "Results are fed back through ingestion"). A snapshot the
    /// classifier still can't place is simply dropped here — it stays
    /// discoverable the next time something re-triggers catch-up for its
    /// conversation.
    async fn ingest_recovered(&self, snapshots: Vec<MailSnapshot>) {
        for snapshot in snapshots {
            if let Err(err) = self.store.try_add_mail(&snapshot, None).await {
                tracing::warn!(target: "osem_catchup", "failed to ingest recovered mail {}: {err}", snapshot.entry_id);
            }
        }
    }

    async fn enqueue_inner(&self, event_id: &str, conversation_id: &str, full_history: bool, priority: bool) {
        let key = tracker_key(event_id, conversation_id);
        if !self.tracker.insert(key) {
            return;
        }
        let request = CatchupRequest {
            event_id: event_id.to_string(),
            conversation_id: conversation_id.to_string(),
            full_history,
        };
        let mut queue = self.queue.lock().await;
        if priority {
            queue.push_front(request);
        } else {
            queue.push_back(request);
        }
    }

    pub async fn enqueue(&self, event_id: &str, conversation_id: &str, full_history: bool) {
        self.enqueue_inner(event_id, conversation_id, full_history, false).await;
    }

    /// Spawns the periodic tick (10s initial delay, then every 15 min) and
    /// the independent 30s force-drain poll for the pending-search queue.
    pub fn spawn_background_tasks(self: &Arc<Self>) {
        let tick_engine = Arc::clone(self);
        tokio::spawn(async move {
            sleep(tick_engine.tuning.initial_tick_delay).await;
            let mut ticker = interval(tick_engine.tuning.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick_engine.drain(tick_engine.tuning.drain_batch_size).await;
            }
        });

        let poll_engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(poll_engine.tuning.force_drain_poll_interval);
            loop {
                ticker.tick().await;
                if !poll_engine.is_paused_by_sync() {
                    let recovered = poll_engine.search.force_drain().await;
                    poll_engine.ingest_recovered(recovered).await;
                }
            }
        });
    }

    /// The facade's `trigger_catchup` contract (spec §4.5): enqueues each
    /// conversation (skipping already-tracked ones), biasing them to the
    /// front of the queue, and, when `immediate`, blocks the caller until
    /// either they drain or `timeout` elapses.
    pub async fn trigger(
        self: &Arc<Self>,
        event_id: &str,
        conversation_ids: &[String],
        immediate: bool,
        timeout: Option<std::time::Duration>,
        full_history: bool,
    ) {
        for conversation_id in conversation_ids {
            self.enqueue_inner(event_id, conversation_id, full_history, true).await;
        }
        if !immediate {
            return;
        }
        let drain = self.drain(usize::MAX);
        match timeout {
            Some(timeout) => {
                let _ = tokio::time::timeout(timeout, drain).await;
            }
            None => drain.await,
        }
    }

    /// Drains up to `limit` queued requests. A no-op while sync is active or
    /// another drain is already in flight (spec §5 "a (1,1) semaphore
    /// serialises worker entry so only one drain runs at a time").
    pub async fn drain(&self, limit: usize) {
        if self.is_paused_by_sync() {
            return;
        }
        let Ok(_permit) = self.drain_permit.try_acquire() else {
            return;
        };
        for _ in 0..limit {
            if self.is_paused_by_sync() {
                break;
            }
            let request = self.queue.lock().await.pop_front();
            let Some(request) = request else { break };
            self.tracker.remove(&tracker_key(&request.event_id, &request.conversation_id));
            self.process_request(&request).await;
        }
    }

    async fn process_request(&self, request: &CatchupRequest) {
        let Some(event) = self.store.get_by_id(&request.event_id).await else {
            // Dropped/archived since enqueue — the queue holds ids, never
            // live references, so this can never strand a worker (spec §9).
            return;
        };

        let lookback_days = if request.full_history {
            FULL_HISTORY_LOOKBACK_DAYS
        } else {
            NORMAL_LOOKBACK_DAYS
        };
        let now = Utc::now();
        let earliest = event.emails.iter().map(|e| e.received_on).min().unwrap_or(now);
        let since: DateTime<Utc> =
            (now - Duration::days(lookback_days)).min(earliest - Duration::hours(EARLIEST_EXTENSION_HOURS));

        let known_entry_ids: HashSet<String> = event
            .emails
            .iter()
            .filter(|e| e.conversation_id.eq_ignore_ascii_case(&request.conversation_id))
            .map(|e| e.entry_id.to_lowercase())
            .collect();
        let seed_entry_id = known_entry_ids.iter().next().cloned().unwrap_or_default();

        let mut candidates: Vec<MailSnapshot> = Vec::new();
        let mut conversation_complete = false;

        match self
            .adapter
            .enumerate_conversation(&seed_entry_id, &request.conversation_id, since)
            .await
        {
            Ok((found, size)) => {
                conversation_complete = size.total <= known_entry_ids.len();
                candidates.extend(found);
            }
            Err(err) => {
                tracing::debug!(target: "osem_catchup", "conversation API failed for {}: {err}", request.conversation_id);
            }
        }

        if !conversation_complete {
            let filter = FilterExpr::or(vec![
                FilterExpr::ConversationId(request.conversation_id.clone()),
                FilterExpr::ReceivedSince(since),
            ]);
            for folder in [FolderKind::Inbox, FolderKind::Sent, FolderKind::Deleted] {
                if let Ok(found) = self.adapter.restrict_folder(folder, &filter).await {
                    candidates.extend(found);
                }
            }

            for subject in &event.related_subjects {
                let tokens = subject_tokens(subject.as_str());
                if tokens.is_empty() {
                    continue;
                }
                let trailing_wildcard = tokens.len() <= WILDCARD_TOKEN_THRESHOLD;
                for (i, token) in tokens.iter().enumerate() {
                    let filter = FilterExpr::SubjectPhrase {
                        phrase: token.clone(),
                        trailing_wildcard: trailing_wildcard && i == tokens.len() - 1,
                    };
                    if let Ok(found) = self
                        .adapter
                        .search(&SearchScope::all_mail(), &filter, &request.event_id)
                        .await
                    {
                        candidates.extend(found);
                    }
                }
            }
        }

        let mut seen_entry_ids: HashSet<String> = HashSet::new();
        let mut newly_unresolved: Vec<String> = Vec::new();
        for candidate in candidates {
            if !seen_entry_ids.insert(candidate.entry_id.to_lowercase()) {
                continue;
            }
            if !candidate_plausible_for_event(&candidate, &event) {
                continue;
            }
            match self.store.try_add_mail(&candidate, Some(&request.event_id)).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if !candidate.internet_message_id.is_empty() {
                        newly_unresolved.push(candidate.internet_message_id.clone());
                    }
                    self.search
                        .enqueue(request.event_id.clone(), request.conversation_id.clone(), candidate.entry_id.clone())
                        .await;
                }
                Err(err) => {
                    tracing::warn!(target: "osem_catchup", "catch-up upsert failed for {}: {err}", candidate.entry_id);
                }
            }
        }

        if !newly_unresolved.is_empty() {
            if let Err(err) = self.store.mark_message_ids_not_found(&request.event_id, &newly_unresolved).await {
                tracing::warn!(target: "osem_catchup", "failed to record not-found message ids: {err}");
            }
        }

        if conversation_complete {
            tracing::debug!(
                target: "osem_catchup",
                "event {}: conversation {} completeness satisfied",
                request.event_id,
                request.conversation_id
            );
        }
    }
}

/// The folder/subject-token cascade casts a much wider net than the
/// conversation API, so before spending a `try_add_mail` scoring pass on
/// each hit it's checked against the secondary signals (spec §4.3) against
/// every email already in the event — disabled for live classification, but
/// still the cheapest way to reject an obviously-unrelated subject-token hit
/// during catch-up's search phase (spec §4.4 step 3).
fn candidate_plausible_for_event(candidate: &MailSnapshot, event: &Event) -> bool {
    event.emails.iter().any(|email| {
        conversation_id_matches(candidate, email)
            || reference_message_id_matches(candidate, email)
            || thread_root_matches(candidate, email)
            || body_fingerprint_matches(candidate, email)
    })
}

/// Splits a subject into up to [`MAX_SUBJECT_TOKENS`] letter/digit runs for
/// the subject-filter cascade (spec §4.4 step 3c).
fn subject_tokens(subject: &str) -> Vec<String> {
    subject
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .take(MAX_SUBJECT_TOKENS)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_tokens_splits_on_non_alphanumeric_runs() {
        assert_eq!(subject_tokens("Quote for PO-123!"), vec!["Quote", "for", "PO", "123"]);
    }

    #[test]
    fn subject_tokens_caps_at_five() {
        let tokens = subject_tokens("a b c d e f g h");
        assert_eq!(tokens.len(), MAX_SUBJECT_TOKENS);
    }
}
