use crate::same_mail::is_same_mail;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use osem_core::{Attachment, ChangeReason, Email, Event, EventChanged, EventStatus, MailSnapshot, StoreError};
use osem_match::MatchConfig;
use osem_text::normalize_subject;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

struct StoreInner {
    events: Vec<Event>,
}

/// Owns the event collection behind a single exclusive lock and persists it
/// to `path` after every mutation (spec §4.2). Notification fan-out rides a
/// broadcast channel rather than a single callback, so the facade and any
/// number of catch-up workers can subscribe independently.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<Mutex<StoreInner>>,
    changes: broadcast::Sender<EventChanged>,
    path: PathBuf,
}

impl EventStore {
    /// Loads `path` if it exists, otherwise starts from an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let events = if path.exists() {
            let content = tokio::fs::read(&path).await?;
            if content.is_empty() {
                Vec::new()
            } else {
                serde_json::from_slice(&content)?
            }
        } else {
            Vec::new()
        };
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner { events })),
            changes,
            path,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventChanged> {
        self.changes.subscribe()
    }

    fn notify(&self, event: Event, reason: ChangeReason) {
        // No receivers is not an error: callers may not be listening yet.
        let _ = self.changes.send(EventChanged { event, reason });
    }

    async fn persist(&self, events: &[Event]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(events)?;
        let tmp_path = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp_path, &payload).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Vec<Event> {
        self.inner.lock().await.events.clone()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Event> {
        self.inner.lock().await.events.iter().find(|e| e.event_id == id).cloned()
    }

    pub async fn create_from_mail(
        &self,
        mail: &MailSnapshot,
        template_id: Option<String>,
        known_participants: Option<&HashSet<osem_core::CiString>>,
    ) -> Result<Event, StoreError> {
        let now = Utc::now();
        let event = build_event_from_mail(mail, template_id, known_participants, now);

        let mut guard = self.inner.lock().await;
        guard.events.push(event.clone());
        self.persist(&guard.events).await?;
        drop(guard);
        self.notify(event.clone(), ChangeReason::Created);
        Ok(event)
    }

    pub async fn update(&self, event: Event) -> Result<Event, StoreError> {
        let mut guard = self.inner.lock().await;
        let slot = guard
            .events
            .iter_mut()
            .find(|e| e.event_id == event.event_id)
            .ok_or_else(|| StoreError::NotFound(event.event_id.clone()))?;
        *slot = event.clone();
        self.persist(&guard.events).await?;
        drop(guard);
        self.notify(event.clone(), ChangeReason::Updated);
        Ok(event)
    }

    pub async fn import(&self, event: Event) -> Result<Event, StoreError> {
        let mut guard = self.inner.lock().await;
        match guard.events.iter_mut().find(|e| e.event_id == event.event_id) {
            Some(slot) => *slot = event.clone(),
            None => guard.events.push(event.clone()),
        }
        self.persist(&guard.events).await?;
        drop(guard);
        self.notify(event.clone(), ChangeReason::Imported);
        Ok(event)
    }

    pub async fn archive(&self, ids: &[String]) -> Result<Vec<Event>, StoreError> {
        let now = Utc::now();
        let mut guard = self.inner.lock().await;
        let mut archived = Vec::new();
        for event in guard.events.iter_mut() {
            if ids.iter().any(|id| id == &event.event_id) && event.status == EventStatus::Open {
                event.status = EventStatus::Archived;
                event.touch(now);
                archived.push(event.clone());
            }
        }
        self.persist(&guard.events).await?;
        drop(guard);
        for event in &archived {
            self.notify(event.clone(), ChangeReason::Archived);
        }
        Ok(archived)
    }

    pub async fn reopen(&self, id: &str) -> Result<Event, StoreError> {
        let now = Utc::now();
        let mut guard = self.inner.lock().await;
        let event = guard
            .events
            .iter_mut()
            .find(|e| e.event_id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        event.status = EventStatus::Open;
        event.touch(now);
        let result = event.clone();
        self.persist(&guard.events).await?;
        drop(guard);
        self.notify(result.clone(), ChangeReason::Reopened);
        Ok(result)
    }

    pub async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        let mut deleted = Vec::new();
        guard.events.retain(|e| {
            if ids.iter().any(|id| id == &e.event_id) {
                deleted.push(e.clone());
                false
            } else {
                true
            }
        });
        self.persist(&guard.events).await?;
        drop(guard);
        for event in deleted {
            self.notify(event, ChangeReason::Deleted);
        }
        Ok(())
    }

    /// The hot path (spec §4.3): classify `snapshot` against every Open
    /// event and, if one is accepted, fold it in via the upsert rules.
    /// Returns `None` without mutating anything when nothing scores above
    /// the acceptance threshold — unmatched mail is dropped, never used to
    /// implicitly create an event.
    pub async fn try_add_mail(
        &self,
        snapshot: &MailSnapshot,
        preferred_event_id: Option<&str>,
    ) -> Result<Option<Event>, StoreError> {
        let mut guard = self.inner.lock().await;
        let result = osem_match::classify(snapshot, &guard.events, preferred_event_id, &MatchConfig::default());
        for line in &result.diagnostics {
            tracing::debug!(target: "osem_store::classify", "{line}");
        }
        let Some(candidate) = result.accepted else {
            return Ok(None);
        };

        let idx = guard
            .events
            .iter()
            .position(|e| e.event_id == candidate.event_id)
            .ok_or_else(|| StoreError::Corrupt(format!("matched event {} vanished mid-lock", candidate.event_id)))?;

        let reason = upsert_mail_into_event(&mut guard.events[idx], snapshot, false);
        let event = guard.events[idx].clone();
        self.persist(&guard.events).await?;
        drop(guard);
        if let Some(reason) = reason {
            self.notify(event.clone(), reason);
        }
        Ok(Some(event))
    }

    /// Bypasses matching entirely and always appends to the named event;
    /// the only path allowed to restore a soft-deleted member (spec §4.2).
    pub async fn add_mail_to_event(&self, event_id: &str, snapshot: &MailSnapshot) -> Result<Option<Event>, StoreError> {
        let mut guard = self.inner.lock().await;
        let Some(idx) = guard.events.iter().position(|e| e.event_id == event_id) else {
            return Ok(None);
        };
        let reason = upsert_mail_into_event(&mut guard.events[idx], snapshot, true);
        let event = guard.events[idx].clone();
        self.persist(&guard.events).await?;
        drop(guard);
        if let Some(reason) = reason {
            self.notify(event.clone(), reason);
        }
        Ok(Some(event))
    }

    /// Soft-deletes the member mail identified by `entry_id` or, failing
    /// that, `message_id`; strips its attachments; drops the subject from
    /// `related_subjects` iff no other active member still uses it.
    pub async fn remove_mail(
        &self,
        event_id: &str,
        entry_id: Option<&str>,
        message_id: Option<&str>,
    ) -> Result<Option<Event>, StoreError> {
        let now = Utc::now();
        let mut guard = self.inner.lock().await;
        let Some(idx) = guard.events.iter().position(|e| e.event_id == event_id) else {
            return Ok(None);
        };
        let event = &mut guard.events[idx];

        let target = event.emails.iter().position(|e| {
            !e.is_removed
                && ((entry_id.is_some_and(|id| e.entry_id.eq_ignore_ascii_case(id)))
                    || (message_id.is_some_and(|mid| e.internet_message_id.eq_ignore_ascii_case(mid))))
        });
        let Some(target) = target else {
            return Ok(Some(event.clone()));
        };

        let removed_subject = normalize_subject(&event.emails[target].subject);
        event.emails[target].is_removed = true;
        let removed_entry_id = event.emails[target].entry_id.clone();
        event.attachments.retain(|a| a.source_mail_entry_id != removed_entry_id);

        let subject_still_used = event
            .active_emails()
            .any(|e| normalize_subject(&e.subject).eq_ignore_ascii_case(&removed_subject));
        if !subject_still_used {
            event.related_subjects.retain(|s| !s.as_str().eq_ignore_ascii_case(&removed_subject));
        }
        event.touch(now);
        let result = event.clone();
        self.persist(&guard.events).await?;
        drop(guard);
        self.notify(result.clone(), ChangeReason::MailRemoved);
        Ok(Some(result))
    }

    pub async fn mark_message_ids_not_found(&self, event_id: &str, ids: &[String]) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        let event = guard
            .events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or_else(|| StoreError::NotFound(event_id.to_string()))?;
        for id in ids {
            event.not_found_message_ids.insert(osem_core::CiString::new(id));
        }
        self.persist(&guard.events).await?;
        Ok(())
    }
}

fn build_event_from_mail(
    mail: &MailSnapshot,
    template_id: Option<String>,
    known_participants: Option<&HashSet<osem_core::CiString>>,
    now: DateTime<Utc>,
) -> Event {
    let mut related_subjects: HashSet<osem_core::CiString> = HashSet::new();
    push_normalized_subject(&mut related_subjects, &mail.subject);
    for historical in &mail.historical_subjects {
        push_normalized_subject(&mut related_subjects, historical);
    }

    let mut participants = mail.participants.clone();
    if let Some(extra) = known_participants {
        participants.extend(extra.iter().cloned());
    }

    let mut conversation_ids = IndexSet::new();
    if !mail.conversation_id.is_empty() {
        conversation_ids.insert(mail.conversation_id.clone());
    }

    let attachments: Vec<Attachment> = mail.attachments.clone();
    let email = Email::from_snapshot(mail);

    Event {
        event_id: osem_core::ids::new_event_id(now),
        title: mail.subject.clone(),
        template_id,
        status: EventStatus::Open,
        priority: 0,
        created_at: now,
        updated_at: now,
        conversation_ids,
        related_subjects,
        participants,
        not_found_message_ids: HashSet::new(),
        processed_message_ids: HashSet::new(),
        emails: vec![email],
        attachments,
        dashboard_items: Vec::new(),
        display_column_source: String::new(),
        display_column_custom: String::new(),
        additional_files: Vec::new(),
    }
}

fn push_normalized_subject(set: &mut HashSet<osem_core::CiString>, raw: &str) {
    let normalized = normalize_subject(raw);
    if !normalized.is_empty() {
        set.insert(osem_core::CiString::new(&normalized));
    }
}

/// Folds `snapshot` into `event` per the upsert semantics of spec §4.2,
/// returning the change-notification reason if anything actually changed.
fn upsert_mail_into_event(event: &mut Event, snapshot: &MailSnapshot, allow_restore: bool) -> Option<ChangeReason> {
    let now = Utc::now();

    if !snapshot.conversation_id.is_empty() {
        event.conversation_ids.insert(snapshot.conversation_id.clone());
    }

    let existing_idx = event.emails.iter().position(|e| is_same_mail(e, snapshot));

    let Some(existing_idx) = existing_idx else {
        push_normalized_subject(&mut event.related_subjects, &snapshot.subject);
        for historical in &snapshot.historical_subjects {
            push_normalized_subject(&mut event.related_subjects, historical);
        }
        event.participants.extend(snapshot.participants.iter().cloned());
        event.attachments.extend(snapshot.attachments.clone());
        event.emails.push(Email::from_snapshot(snapshot));
        event.touch(now);
        return Some(ChangeReason::MailAppended);
    };

    if event.emails[existing_idx].is_removed && !allow_restore {
        return None;
    }

    let mut content_changed = false;
    let prior_entry_id = event.emails[existing_idx].entry_id.clone();
    {
        let existing = &mut event.emails[existing_idx];

        if existing.is_removed && allow_restore {
            existing.is_removed = false;
            content_changed = true;
        }

        if !snapshot.sender.is_empty() && existing.sender != snapshot.sender {
            existing.sender = snapshot.sender.clone();
            content_changed = true;
        }
        if !snapshot.subject.is_empty() && existing.subject != snapshot.subject {
            existing.subject = snapshot.subject.clone();
            content_changed = true;
        }
        if !snapshot.body_fingerprint.is_empty() && existing.body_fingerprint != snapshot.body_fingerprint {
            existing.body_fingerprint = snapshot.body_fingerprint.clone();
            content_changed = true;
        }
        if !snapshot.participants.is_empty() && existing.participants != snapshot.participants {
            existing.participants = snapshot.participants.clone();
            content_changed = true;
        }

        if !snapshot.entry_id.is_empty() && existing.entry_id != snapshot.entry_id {
            existing.entry_id = snapshot.entry_id.clone();
            content_changed = true;
        }
        if !snapshot.store_id.is_empty() {
            existing.store_id = snapshot.store_id.clone();
        }
        if !snapshot.conversation_id.is_empty() {
            existing.conversation_id = snapshot.conversation_id.clone();
        }
        if !snapshot.to.is_empty() {
            existing.to = snapshot.to.clone();
        }
        if !snapshot.thread_index.is_empty() {
            existing.thread_index = snapshot.thread_index.clone();
            existing.thread_index_prefix = snapshot.thread_index_prefix.clone();
        }
        existing
            .reference_message_ids
            .extend(snapshot.reference_message_ids.iter().cloned());
        existing.received_on = snapshot.received_on;

        let already_processed = event
            .processed_message_ids
            .contains(&osem_core::CiString::new(existing.internet_message_id.as_str()));
        if content_changed && !already_processed {
            existing.is_new_or_updated = true;
        }
    }

    if !content_changed {
        return None;
    }

    event.attachments.retain(|a| a.source_mail_entry_id != prior_entry_id);
    event.attachments.extend(snapshot.attachments.clone());
    push_normalized_subject(&mut event.related_subjects, &snapshot.subject);
    event.participants.extend(snapshot.participants.iter().cloned());
    event.touch(now);
    Some(ChangeReason::MailUpdated)
}
