use osem_core::{Email, MailSnapshot};
use osem_text::{fingerprints_similar, normalize_message_id};

/// Whether `candidate` is another copy of `existing` rather than a distinct
/// mail (spec §4.2 "IsSameMail"), tried in order and short-circuiting on the
/// first rule that fires.
pub fn is_same_mail(existing: &Email, candidate: &MailSnapshot) -> bool {
    if !existing.entry_id.is_empty()
        && !candidate.entry_id.is_empty()
        && existing.entry_id.eq_ignore_ascii_case(&candidate.entry_id)
    {
        return true;
    }

    let existing_mid = normalize_message_id(&existing.internet_message_id);
    let candidate_mid = normalize_message_id(&candidate.internet_message_id);
    if !existing_mid.is_empty() && existing_mid.eq_ignore_ascii_case(&candidate_mid) {
        return true;
    }

    if !existing.conversation_id.is_empty()
        && existing.conversation_id.eq_ignore_ascii_case(&candidate.conversation_id)
        && existing.entry_id.is_empty()
        && candidate.entry_id.is_empty()
        && existing_mid.is_empty()
        && candidate_mid.is_empty()
        && existing.sender.eq_ignore_ascii_case(&candidate.sender)
        && existing.subject.eq_ignore_ascii_case(&candidate.subject)
        && (existing.received_on - candidate.received_on).num_seconds().abs() <= 30
    {
        return true;
    }

    if !existing.thread_root().is_empty()
        && existing.thread_root().eq_ignore_ascii_case(candidate.thread_root())
        && fingerprints_similar(&existing.body_fingerprint, &candidate.body_fingerprint)
    {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn base_email() -> Email {
        Email {
            entry_id: String::new(),
            store_id: "S".into(),
            conversation_id: String::new(),
            internet_message_id: String::new(),
            sender: String::new(),
            to: String::new(),
            subject: String::new(),
            participants: HashSet::new(),
            body_fingerprint: String::new(),
            thread_index: String::new(),
            thread_index_prefix: String::new(),
            reference_message_ids: HashSet::new(),
            received_on: Utc::now(),
            is_new_or_updated: false,
            is_removed: false,
        }
    }

    fn base_snapshot() -> MailSnapshot {
        MailSnapshot {
            entry_id: String::new(),
            store_id: "S".into(),
            conversation_id: String::new(),
            internet_message_id: String::new(),
            sender: String::new(),
            to: String::new(),
            subject: String::new(),
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

    #[test]
    fn matches_on_entry_id() {
        let mut existing = base_email();
        existing.entry_id = "abc".into();
        let mut candidate = base_snapshot();
        candidate.entry_id = "ABC".into();
        assert!(is_same_mail(&existing, &candidate));
    }

    #[test]
    fn matches_on_message_id_when_entry_ids_absent() {
        let mut existing = base_email();
        existing.internet_message_id = "<m1@acme>".into();
        let mut candidate = base_snapshot();
        candidate.internet_message_id = "m1@acme".into();
        assert!(is_same_mail(&existing, &candidate));
    }

    #[test]
    fn matches_on_conversation_sender_subject_and_close_timestamps() {
        let now = Utc::now();
        let mut existing = base_email();
        existing.conversation_id = "conv-1".into();
        existing.sender = "alice@acme.com".into();
        existing.subject = "Quote".into();
        existing.received_on = now;
        let mut candidate = base_snapshot();
        candidate.conversation_id = "CONV-1".into();
        candidate.sender = "ALICE@ACME.COM".into();
        candidate.subject = "quote".into();
        candidate.received_on = now + chrono::Duration::seconds(10);
        assert!(is_same_mail(&existing, &candidate));
    }

    #[test]
    fn does_not_match_when_timestamps_drift_too_far() {
        let now = Utc::now();
        let mut existing = base_email();
        existing.conversation_id = "conv-1".into();
        existing.sender = "alice@acme.com".into();
        existing.subject = "Quote".into();
        existing.received_on = now;
        let mut candidate = base_snapshot();
        candidate.conversation_id = "conv-1".into();
        candidate.sender = "alice@acme.com".into();
        candidate.subject = "Quote".into();
        candidate.received_on = now + chrono::Duration::seconds(60);
        assert!(!is_same_mail(&existing, &candidate));
    }

    #[test]
    fn matches_on_thread_root_and_similar_fingerprint() {
        let mut existing = base_email();
        existing.thread_index = "x".repeat(50);
        existing.body_fingerprint = "HELLO WORLD THIS IS A TEST MESSAGE".into();
        let mut candidate = base_snapshot();
        candidate.thread_index = "x".repeat(50);
        candidate.body_fingerprint = "HELLO WORLD THIS IS A TEST MESSAGE".into();
        assert!(is_same_mail(&existing, &candidate));
    }

    #[test]
    fn unrelated_mails_do_not_match() {
        let existing = base_email();
        let candidate = base_snapshot();
        assert!(!is_same_mail(&existing, &candidate));
    }
}
