use crate::ci_string::CiString;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Status of an [`Event`]. Archived events are invisible to the matching
/// engine (spec §3 invariant: "Archived events are invisible to the Matching
/// Engine").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Open,
    Archived,
}

/// One attachment on a member [`Email`]. `id` is `entry_id:position:filename`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub extension: String,
    pub size_bytes: u64,
    pub source_mail_entry_id: String,
}

impl Attachment {
    pub fn new(source_mail_entry_id: &str, position: usize, filename: &str, size_bytes: u64) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        Self {
            id: crate::ids::attachment_id(source_mail_entry_id, position, filename),
            filename: filename.to_string(),
            extension,
            size_bytes,
            source_mail_entry_id: source_mail_entry_id.to_string(),
        }
    }
}

/// A mail message currently (or previously) associated with an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub entry_id: String,
    pub store_id: String,
    pub conversation_id: String,
    pub internet_message_id: String,
    pub sender: String,
    pub to: String,
    pub subject: String,
    pub participants: HashSet<CiString>,
    pub body_fingerprint: String,
    pub thread_index: String,
    pub thread_index_prefix: String,
    pub reference_message_ids: HashSet<CiString>,
    pub received_on: DateTime<Utc>,
    pub is_new_or_updated: bool,
    pub is_removed: bool,
}

/// The immutable, adapter-delivered description of one mail (spec §3
/// "MailSnapshot"). This is what the outside world hands to the engine; it
/// carries no mutable UI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSnapshot {
    pub entry_id: String,
    pub store_id: String,
    pub conversation_id: String,
    pub internet_message_id: String,
    pub sender: String,
    pub to: String,
    pub subject: String,
    pub participants: HashSet<CiString>,
    pub body_fingerprint: String,
    pub thread_index: String,
    pub thread_index_prefix: String,
    pub reference_message_ids: HashSet<CiString>,
    pub received_on: DateTime<Utc>,
    pub historical_subjects: Vec<String>,
    pub attachments: Vec<Attachment>,
}

impl MailSnapshot {
    /// The root anchor used by `IsSameMail` rule 4: the first 44 characters
    /// of the thread-index (distinct from the 27-byte `thread_index_prefix`
    /// used for catch-up search hints, per spec Glossary).
    pub fn thread_root(&self) -> &str {
        let end = self
            .thread_index
            .char_indices()
            .nth(44)
            .map(|(i, _)| i)
            .unwrap_or(self.thread_index.len());
        &self.thread_index[..end]
    }
}

impl Email {
    pub fn thread_root(&self) -> &str {
        let end = self
            .thread_index
            .char_indices()
            .nth(44)
            .map(|(i, _)| i)
            .unwrap_or(self.thread_index.len());
        &self.thread_index[..end]
    }

    pub fn from_snapshot(snapshot: &MailSnapshot) -> Self {
        Self {
            entry_id: snapshot.entry_id.clone(),
            store_id: snapshot.store_id.clone(),
            conversation_id: snapshot.conversation_id.clone(),
            internet_message_id: snapshot.internet_message_id.clone(),
            sender: snapshot.sender.clone(),
            to: snapshot.to.clone(),
            subject: snapshot.subject.clone(),
            participants: snapshot.participants.clone(),
            body_fingerprint: snapshot.body_fingerprint.clone(),
            thread_index: snapshot.thread_index.clone(),
            thread_index_prefix: snapshot.thread_index_prefix.clone(),
            reference_message_ids: snapshot.reference_message_ids.clone(),
            received_on: snapshot.received_on,
            is_new_or_updated: true,
            is_removed: false,
        }
    }
}

/// The aggregate business object: every message, attachment, and participant
/// belonging to a single logical work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub title: String,
    pub template_id: Option<String>,
    pub status: EventStatus,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub conversation_ids: IndexSet<String>,
    pub related_subjects: HashSet<CiString>,
    pub participants: HashSet<CiString>,
    pub not_found_message_ids: HashSet<CiString>,
    pub processed_message_ids: HashSet<CiString>,
    pub emails: Vec<Email>,
    pub attachments: Vec<Attachment>,
    pub dashboard_items: Vec<(String, String)>,
    pub display_column_source: String,
    pub display_column_custom: String,
    pub additional_files: Vec<String>,
}

impl Event {
    /// The title, or the subject of the first member mail if the title was
    /// never set to anything else — used by the matching engine's
    /// "title OR first member's subject" candidate set (spec §4.3).
    pub fn first_mail_subject(&self) -> Option<&str> {
        self.emails.first().map(|e| e.subject.as_str())
    }

    /// Candidate subjects the matching engine compares against: title, first
    /// member's subject, and every entry of `related_subjects`.
    pub fn candidate_subjects(&self) -> Vec<String> {
        let mut subjects = vec![self.title.clone()];
        if let Some(first) = self.first_mail_subject() {
            subjects.push(first.to_string());
        }
        subjects.extend(self.related_subjects.iter().map(|s| s.0.clone()));
        subjects
    }

    pub fn active_emails(&self) -> impl Iterator<Item = &Email> {
        self.emails.iter().filter(|e| !e.is_removed)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Reasons attached to an [`EventChanged`] notification (spec §4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Created,
    Updated,
    Imported,
    Archived,
    Reopened,
    Deleted,
    MailAppended,
    MailUpdated,
    MailRemoved,
}

/// Emitted after a mutation commits (spec §4.2 "Change notifications").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventChanged {
    pub event: Event,
    pub reason: ChangeReason,
}
