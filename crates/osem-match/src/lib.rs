//! Scored candidate selection: turns a [`MailSnapshot`] into *accept into
//! event E* or *reject* (spec §4.3). Pure and synchronous — the matching
//! engine never touches the store or the mail source; it only reads the
//! event slice it is handed.

mod secondary;
mod subject_rules;

pub use secondary::{body_fingerprint_matches, conversation_id_matches, reference_message_id_matches, thread_root_matches};
pub use subject_rules::{standard_match, truncated_match};

use chrono::{DateTime, Utc};
use osem_core::{CiString, Event, MailSnapshot};
use serde::{Deserialize, Serialize};

/// Score threshold for acceptance (spec §4.3).
pub const ACCEPT_THRESHOLD: i64 = 25;

const WEIGHT_SUBJECT_PARTICIPANT: i64 = 70;
const WEIGHT_TRUNCATED_HISTORICAL: i64 = 70;
const WEIGHT_HISTORICAL_SUBJECT: i64 = 70;
const WEIGHT_PREFERRED_BIAS: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    SubjectParticipant,
    TruncatedSubjectHistorical,
    HistoricalSubject,
    PreferredBias,
}

/// Whether the secondary signals of spec §4.3 (conversation-id,
/// reference-message-id, thread-index, body-fingerprint) participate in
/// scoring. Disabled by default, matching the production ruleset (spec §9);
/// they remain available unconditionally to the catch-up engine's search
/// phase via the functions in [`secondary`].
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub secondary_signals_enabled: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            secondary_signals_enabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub event_id: String,
    pub score: i64,
    pub reasons: Vec<MatchReason>,
    pub preferred_applied: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClassifyResult {
    pub accepted: Option<Candidate>,
    /// Human-readable diagnostics covering every candidate considered, kept
    /// even on rejection so the facade can log the full score breakdown
    /// (spec §4.3 "Diagnostics").
    pub diagnostics: Vec<String>,
}

fn participants_intersect(snapshot: &MailSnapshot, event: &Event) -> bool {
    // `HashSet::contains(&str)` would silently defeat case-insensitivity here:
    // `CiString`'s `Hash` lowercases but `str`'s does not, so the borrowed
    // lookup lands in the wrong bucket for anything but an exact-case match.
    snapshot.participants.iter().any(|p| event.participants.contains(p))
}

fn any_subject_match(candidate_subjects: &[String], needle: &str) -> bool {
    candidate_subjects.iter().any(|c| standard_match(needle, c))
}

fn any_truncated_match(candidate_subjects: &[String], needle: &str) -> bool {
    candidate_subjects.iter().any(|c| truncated_match(needle, c))
}

fn score_event(snapshot: &MailSnapshot, event: &Event) -> (i64, Vec<MatchReason>, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();
    let mut diagnostics = Vec::new();
    let candidate_subjects = event.candidate_subjects();
    let participants_match = participants_intersect(snapshot, event);

    if participants_match && any_subject_match(&candidate_subjects, &snapshot.subject) {
        score += WEIGHT_SUBJECT_PARTICIPANT;
        reasons.push(MatchReason::SubjectParticipant);
        diagnostics.push(format!(
            "event {}: +{} subject+participant standard match",
            event.event_id, WEIGHT_SUBJECT_PARTICIPANT
        ));
    }

    if participants_match
        && any_truncated_match(&candidate_subjects, &snapshot.subject)
        && snapshot
            .historical_subjects
            .iter()
            .any(|h| any_subject_match(&candidate_subjects, h))
    {
        score += WEIGHT_TRUNCATED_HISTORICAL;
        reasons.push(MatchReason::TruncatedSubjectHistorical);
        diagnostics.push(format!(
            "event {}: +{} truncated subject confirmed by historical subject",
            event.event_id, WEIGHT_TRUNCATED_HISTORICAL
        ));
    }

    if participants_match
        && snapshot
            .historical_subjects
            .iter()
            .any(|h| any_subject_match(&candidate_subjects, h))
    {
        score += WEIGHT_HISTORICAL_SUBJECT;
        reasons.push(MatchReason::HistoricalSubject);
        diagnostics.push(format!(
            "event {}: +{} historical subject match",
            event.event_id, WEIGHT_HISTORICAL_SUBJECT
        ));
    }

    if score == 0 {
        diagnostics.push(format!("event {}: no signal matched, score 0", event.event_id));
    }

    (score, reasons, diagnostics)
}

/// Chooses at most one Open event for `snapshot`, or `None` if nothing
/// scores at least [`ACCEPT_THRESHOLD`]. Archived events are never
/// considered (spec §3 invariant).
pub fn classify(
    snapshot: &MailSnapshot,
    events: &[Event],
    preferred_event_id: Option<&str>,
    _config: &MatchConfig,
) -> ClassifyResult {
    let mut diagnostics = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for event in events {
        if event.status != osem_core::EventStatus::Open {
            continue;
        }
        let (mut score, mut reasons, event_diagnostics) = score_event(snapshot, event);
        diagnostics.extend(event_diagnostics);

        let mut preferred_applied = false;
        if score > 0 {
            if let Some(preferred) = preferred_event_id {
                if preferred.eq_ignore_ascii_case(&event.event_id) {
                    score += WEIGHT_PREFERRED_BIAS;
                    reasons.push(MatchReason::PreferredBias);
                    preferred_applied = true;
                    diagnostics.push(format!(
                        "event {}: +{} preferred bias applied",
                        event.event_id, WEIGHT_PREFERRED_BIAS
                    ));
                }
            }
        }

        if score > 0 {
            candidates.push(Candidate {
                event_id: event.event_id.clone(),
                score,
                reasons,
                preferred_applied,
                updated_at: event.updated_at,
            });
        }
    }

    candidates.sort_by(|a, b| {
        let score_cmp = score_ties_equal(a.score, b.score);
        if score_cmp != std::cmp::Ordering::Equal {
            return score_cmp;
        }
        b.preferred_applied
            .cmp(&a.preferred_applied)
            .then_with(|| b.reasons.len().cmp(&a.reasons.len()))
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });

    let accepted = candidates.into_iter().find(|c| c.score as f64 >= ACCEPT_THRESHOLD as f64);
    if accepted.is_none() {
        diagnostics.push("no candidate reached the acceptance threshold; mail dropped".to_string());
    }

    ClassifyResult { accepted, diagnostics }
}

/// Sort key for scores, treating differences under 0.01 as ties (spec
/// §4.3 disambiguation rule 1). Scores are integral in this ruleset, so this
/// degenerates to an exact comparison, kept explicit for fidelity to spec
/// wording and to stay correct if weights ever become fractional.
fn score_ties_equal(a: i64, b: i64) -> std::cmp::Ordering {
    let diff = (a - b) as f64;
    if diff.abs() < 0.01 {
        std::cmp::Ordering::Equal
    } else {
        b.cmp(&a)
    }
}

/// True if any of `snapshot`'s participants are present, case-insensitively,
/// in `needle` (used by callers wiring up preferred-template seeding; kept
/// alongside the matching engine since it shares the case-insensitive
/// participant semantics).
pub fn participant_overlaps(snapshot: &MailSnapshot, participants: &std::collections::HashSet<CiString>) -> bool {
    snapshot.participants.iter().any(|p| participants.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use indexmap::IndexSet;
    use osem_core::EventStatus;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-10T09:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn make_event(id: &str, title: &str, participants: &[&str], updated_at: DateTime<Utc>) -> Event {
        Event {
            event_id: id.into(),
            title: title.into(),
            template_id: None,
            status: EventStatus::Open,
            priority: 0,
            created_at: now(),
            updated_at,
            conversation_ids: IndexSet::new(),
            related_subjects: HashSet::new(),
            participants: participants.iter().map(|p| CiString::new(*p)).collect(),
            not_found_message_ids: HashSet::new(),
            processed_message_ids: HashSet::new(),
            emails: vec![],
            attachments: vec![],
            dashboard_items: vec![],
            display_column_source: String::new(),
            display_column_custom: String::new(),
            additional_files: vec![],
        }
    }

    fn make_snapshot(subject: &str, participants: &[&str], historical: &[&str]) -> MailSnapshot {
        MailSnapshot {
            entry_id: "X".into(),
            store_id: "S".into(),
            conversation_id: "C1".into(),
            internet_message_id: String::new(),
            sender: String::new(),
            to: String::new(),
            subject: subject.into(),
            participants: participants.iter().map(|p| CiString::new(*p)).collect(),
            body_fingerprint: String::new(),
            thread_index: String::new(),
            thread_index_prefix: String::new(),
            reference_message_ids: HashSet::new(),
            received_on: now(),
            historical_subjects: historical.iter().map(|s| s.to_string()).collect(),
            attachments: vec![],
        }
    }

    #[test]
    fn reply_with_matching_subject_and_participant_is_accepted() {
        let event = make_event("E1", "Quote for PO-123", &["ALICE@ACME", "BOB@CORP"], now());
        let snapshot = make_snapshot("RE: Quote for PO-123", &["BOB@CORP"], &[]);
        let result = classify(&snapshot, &[event], None, &MatchConfig::default());
        let accepted = result.accepted.expect("expected a match");
        assert_eq!(accepted.event_id, "E1");
        assert!(accepted.score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn unrelated_mail_is_rejected() {
        let event = make_event("E1", "Quote for PO-123", &["ALICE@ACME"], now());
        let snapshot = make_snapshot("Invoice INV-9", &["DAN@OTHER"], &[]);
        let result = classify(&snapshot, &[event], None, &MatchConfig::default());
        assert!(result.accepted.is_none());
    }

    #[test]
    fn truncated_subject_needs_historical_confirmation() {
        let event = make_event("E1", "Quote for PO-123", &["ALICE@ACME"], now());
        let snapshot = make_snapshot("Quote for", &["ALICE@ACME"], &["Quote for PO-123"]);
        let result = classify(&snapshot, &[event], None, &MatchConfig::default());
        let accepted = result.accepted.expect("expected a match");
        assert!(accepted.reasons.contains(&MatchReason::TruncatedSubjectHistorical));
    }

    #[test]
    fn three_char_prefix_does_not_truncated_match() {
        assert!(!truncated_match("Quo", "Quote for PO-123"));
    }

    #[test]
    fn archived_events_are_never_candidates() {
        let mut event = make_event("E1", "Quote for PO-123", &["ALICE@ACME"], now());
        event.status = EventStatus::Archived;
        let snapshot = make_snapshot("RE: Quote for PO-123", &["ALICE@ACME"], &[]);
        let result = classify(&snapshot, &[event], None, &MatchConfig::default());
        assert!(result.accepted.is_none());
    }

    #[test]
    fn preferred_event_id_breaks_ties_and_marks_preferred_applied() {
        let event_a = make_event("E1", "Quote for PO-123", &["ALICE@ACME"], now());
        let event_b = make_event("E2", "Quote for PO-123", &["ALICE@ACME"], now());
        let snapshot = make_snapshot("RE: Quote for PO-123", &["ALICE@ACME"], &[]);
        let result = classify(&snapshot, &[event_a, event_b], Some("E2"), &MatchConfig::default());
        let accepted = result.accepted.expect("expected a match");
        assert_eq!(accepted.event_id, "E2");
        assert!(accepted.preferred_applied);
    }

    #[test]
    fn more_recently_updated_event_wins_on_tie() {
        let older = make_event(
            "E1",
            "Quote for PO-123",
            &["ALICE@ACME"],
            now() - chrono::Duration::hours(2),
        );
        let newer = make_event("E2", "Quote for PO-123", &["ALICE@ACME"], now());
        let snapshot = make_snapshot("RE: Quote for PO-123", &["ALICE@ACME"], &[]);
        let result = classify(&snapshot, &[older, newer], None, &MatchConfig::default());
        assert_eq!(result.accepted.unwrap().event_id, "E2");
    }
}
