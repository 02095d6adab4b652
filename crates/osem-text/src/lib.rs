//! Pure text-normalisation utilities underlying mail classification: subject
//! canonicalisation, body fingerprinting, participant normalisation, and
//! mojibake repair. No I/O, no async — every function here is a plain,
//! synchronous transform so the matching engine and catch-up engine can call
//! them freely from any execution context.

mod dice;
mod fingerprint;
mod historical_subject;
mod message_id;
mod mojibake;
mod participant;
mod subject;
mod thread_index;
mod ws;

pub use dice::{dice_similarity, fingerprints_similar, matches_baseline};
pub use fingerprint::body_fingerprint;
pub use historical_subject::extract_historical_subjects;
pub use message_id::{extract_message_ids, normalize_message_id};
pub use mojibake::repair_mojibake;
pub use participant::normalize_participant;
pub use subject::{normalize_subject, SUBJECT_PREFIXES};
pub use thread_index::thread_index_prefix;
