use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generates a fresh event id of the form `EVT-YYYYMMDD-HHMMSS-<6 hex>`.
///
/// The spec only requires the id be stable and never reused; the hex suffix
/// combines a process-local counter with the low bits of the timestamp so
/// ids created within the same second remain distinct without pulling in a
/// random-number dependency.
pub fn new_event_id(now: DateTime<Utc>) -> String {
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = (now.timestamp_subsec_nanos() ^ counter.wrapping_mul(0x9E37_79B9)) & 0xFF_FFFF;
    format!(
        "EVT-{}-{:06x}",
        now.format("%Y%m%d-%H%M%S"),
        suffix
    )
}

pub fn attachment_id(entry_id: &str, position: usize, filename: &str) -> String {
    format!("{entry_id}:{position}:{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_even_within_the_same_second() {
        let now = Utc::now();
        let a = new_event_id(now);
        let b = new_event_id(now);
        assert_ne!(a, b);
        assert!(a.starts_with("EVT-"));
    }

    #[test]
    fn attachment_id_is_composed_of_entry_position_filename() {
        assert_eq!(attachment_id("A1", 2, "invoice.pdf"), "A1:2:invoice.pdf");
    }
}
