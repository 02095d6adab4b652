//! Every tunable named in spec §4.4, kept in one place rather than scattered
//! as inline literals.
use std::time::Duration;

/// Periodic tick interval once the engine is up.
pub const TICK_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// First tick fires this long after startup rather than waiting a full
/// [`TICK_INTERVAL`].
pub const INITIAL_TICK_DELAY: Duration = Duration::from_secs(10);
/// A tick drains at most this many queued requests.
pub const DRAIN_BATCH_SIZE: usize = 20;
/// Independent poll that force-drains the pending-search queue once the
/// sync-suspension counter returns to zero.
pub const FORCE_DRAIN_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Normal-run lookback window.
pub const NORMAL_LOOKBACK_DAYS: i64 = 14;
/// "Full history" lookback window, requested explicitly.
pub const FULL_HISTORY_LOOKBACK_DAYS: i64 = 3650;
/// The window is extended this far below the earliest known message in the
/// event, on top of whichever lookback above applies.
pub const EARLIEST_EXTENSION_HOURS: i64 = 12;

/// Debounce before the sync-aware search secondary queue fires an advanced
/// search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_secs(2);
/// Advanced search looks back this far by creation time, in addition to any
/// queued conversation-ids.
pub const SEARCH_LOOKBACK: Duration = Duration::from_secs(60 * 60);
/// Targeted entry-ids that a zero-result search didn't account for are
/// re-enqueued up to this many times.
pub const SEARCH_MAX_RETRIES: u32 = 10;
/// Each sync-aware-search retry is gated by this back-off.
pub const SEARCH_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Back-off ladder for a message that could not be resolved on the live
/// path, before falling through to advanced-search recovery.
pub const DEFERRED_RETRY_BACKOFFS: &[Duration] = &[
    Duration::from_secs(20),
    Duration::from_secs(60),
    Duration::from_secs(180),
    Duration::from_secs(300),
];

/// Subject-token phrase queries take at most this many tokens per subject.
pub const MAX_SUBJECT_TOKENS: usize = 5;
/// A trailing wildcard is allowed only when the subject split into this many
/// tokens or fewer (tolerates header truncation without over-widening a long
/// subject's query).
pub const WILDCARD_TOKEN_THRESHOLD: usize = 3;

/// The subset of the above an embedding host is allowed to override at
/// runtime (the rest — lookback windows, token caps — are load-bearing
/// constants the matching/search semantics assume). Defaults match the
/// constants above exactly; a host that never touches its config file gets
/// identical behaviour to a build without this layer.
#[derive(Debug, Clone, Copy)]
pub struct CatchupTuning {
    pub tick_interval: Duration,
    pub initial_tick_delay: Duration,
    pub drain_batch_size: usize,
    pub force_drain_poll_interval: Duration,
    pub search_max_retries: u32,
    pub search_retry_backoff: Duration,
}

impl Default for CatchupTuning {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            initial_tick_delay: INITIAL_TICK_DELAY,
            drain_batch_size: DRAIN_BATCH_SIZE,
            force_drain_poll_interval: FORCE_DRAIN_POLL_INTERVAL,
            search_max_retries: SEARCH_MAX_RETRIES,
            search_retry_backoff: SEARCH_RETRY_BACKOFF,
        }
    }
}
