use osem_core::{Email, MailSnapshot};
use osem_text::fingerprints_similar;

/// Conversation-id, reference-message-id, thread-index, and body-fingerprint
/// signals. Spec §4.3: "computed and available to implementations as
/// secondary signals, disabled in the production ruleset" for
/// *classification* — they remain live for the catch-up engine's *search*
/// phase (spec §4.4 step 3), which is why they are exposed here rather than
/// deleted.
pub fn conversation_id_matches(snapshot: &MailSnapshot, email: &Email) -> bool {
    !snapshot.conversation_id.is_empty() && snapshot.conversation_id.eq_ignore_ascii_case(&email.conversation_id)
}

pub fn reference_message_id_matches(snapshot: &MailSnapshot, email: &Email) -> bool {
    if email.internet_message_id.is_empty() {
        return false;
    }
    snapshot
        .reference_message_ids
        .iter()
        .any(|r| r.as_str().eq_ignore_ascii_case(&email.internet_message_id))
}

pub fn thread_root_matches(snapshot: &MailSnapshot, email: &Email) -> bool {
    !snapshot.thread_root().is_empty() && snapshot.thread_root().eq_ignore_ascii_case(email.thread_root())
}

pub fn body_fingerprint_matches(snapshot: &MailSnapshot, email: &Email) -> bool {
    !snapshot.body_fingerprint.is_empty()
        && !email.body_fingerprint.is_empty()
        && fingerprints_similar(&snapshot.body_fingerprint, &email.body_fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn email(conversation_id: &str, message_id: &str, fingerprint: &str) -> Email {
        Email {
            entry_id: "E1".into(),
            store_id: "S".into(),
            conversation_id: conversation_id.into(),
            internet_message_id: message_id.into(),
            sender: String::new(),
            to: String::new(),
            subject: String::new(),
            participants: HashSet::new(),
            body_fingerprint: fingerprint.into(),
            thread_index: String::new(),
            thread_index_prefix: String::new(),
            reference_message_ids: HashSet::new(),
            received_on: Utc::now(),
            is_new_or_updated: false,
            is_removed: false,
        }
    }

    fn snapshot(conversation_id: &str, reference_ids: &[&str], fingerprint: &str) -> MailSnapshot {
        MailSnapshot {
            entry_id: "A".into(),
            store_id: "S".into(),
            conversation_id: conversation_id.into(),
            internet_message_id: String::new(),
            sender: String::new(),
            to: String::new(),
            subject: String::new(),
            participants: HashSet::new(),
            body_fingerprint: fingerprint.into(),
            thread_index: String::new(),
            thread_index_prefix: String::new(),
            reference_message_ids: reference_ids.iter().map(|s| (*s).into()).collect(),
            received_on: Utc::now(),
            historical_subjects: vec![],
            attachments: vec![],
        }
    }

    #[test]
    fn conversation_id_match_is_case_insensitive() {
        let snap = snapshot("c1", &[], "");
        let mail = email("C1", "", "");
        assert!(conversation_id_matches(&snap, &mail));
    }

    #[test]
    fn reference_message_id_match_requires_nonempty_id() {
        let snap = snapshot("", &["abc@mail"], "");
        let mail = email("", "abc@mail", "");
        assert!(reference_message_id_matches(&snap, &mail));
        let mail_empty = email("", "", "");
        assert!(!reference_message_id_matches(&snap, &mail_empty));
    }

    #[test]
    fn body_fingerprint_match_uses_dice_similarity() {
        let snap = snapshot("", &[], "HELLO WORLD THIS IS A TEST");
        let mail = email("", "", "HELLO WORLD THIS IS A TEST");
        assert!(body_fingerprint_matches(&snap, &mail));
    }
}
