use osem_catchup::CatchupTuning;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The engine tuning knobs an embedding host can override (spec §9's config
/// layer): catch-up's tick interval, page size, and search back-off. Anything
/// load-bearing for the matching/search semantics themselves (lookback
/// windows, token caps) stays a constant rather than a config value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub catchup_tick_interval_secs: u64,
    pub catchup_initial_tick_delay_secs: u64,
    pub catchup_drain_batch_size: usize,
    pub catchup_force_drain_poll_secs: u64,
    pub catchup_search_max_retries: u32,
    pub catchup_search_retry_backoff_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tuning = CatchupTuning::default();
        Self {
            catchup_tick_interval_secs: tuning.tick_interval.as_secs(),
            catchup_initial_tick_delay_secs: tuning.initial_tick_delay.as_secs(),
            catchup_drain_batch_size: tuning.drain_batch_size,
            catchup_force_drain_poll_secs: tuning.force_drain_poll_interval.as_secs(),
            catchup_search_max_retries: tuning.search_max_retries,
            catchup_search_retry_backoff_secs: tuning.search_retry_backoff.as_secs(),
        }
    }
}

impl EngineConfig {
    pub fn catchup_tuning(&self) -> CatchupTuning {
        CatchupTuning {
            tick_interval: Duration::from_secs(self.catchup_tick_interval_secs),
            initial_tick_delay: Duration::from_secs(self.catchup_initial_tick_delay_secs),
            drain_batch_size: self.catchup_drain_batch_size,
            force_drain_poll_interval: Duration::from_secs(self.catchup_force_drain_poll_secs),
            search_max_retries: self.catchup_search_max_retries,
            search_retry_backoff: Duration::from_secs(self.catchup_search_retry_backoff_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_to_the_same_tuning_as_catchups_own_default() {
        let config = EngineConfig::default();
        let tuning = config.catchup_tuning();
        let baseline = CatchupTuning::default();
        assert_eq!(tuning.tick_interval, baseline.tick_interval);
        assert_eq!(tuning.drain_batch_size, baseline.drain_batch_size);
    }

    #[test]
    fn serializes_to_toml_and_back() {
        let config = EngineConfig::default();
        let toml_text = toml::to_string_pretty(&config).unwrap();
        let reloaded: EngineConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(reloaded.catchup_drain_batch_size, config.catchup_drain_batch_size);
    }
}
