/// One dequeued unit of catch-up work: "go recheck this conversation against
/// this event" (spec §4.4 "Queue and scheduler").
#[derive(Debug, Clone)]
pub struct CatchupRequest {
    pub event_id: String,
    pub conversation_id: String,
    pub full_history: bool,
}

/// The tracker-set dedup key: at most one pending request per
/// `(event_id, conversation_id)` pair (spec §8 "the catch-up tracker admits
/// each (event,conversation) key at most once until it is dequeued").
pub fn tracker_key(event_id: &str, conversation_id: &str) -> String {
    format!("{event_id}::{conversation_id}")
}
