use crate::config::EngineConfig;
use crate::error::EngineError;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const ORG: &str = "io";
const AUTHOR: &str = "OSEM";
const APP: &str = "OSEM";

/// Resolves and owns the engine's on-disk layout, modelled on
/// `cove-config::ConfigManager`: a platform app-data directory holding the
/// tuning file plus the three JSON documents spec §6 names
/// (`event-store.json`, `template_preferences.json`, `llm-config.json`).
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, EngineError> {
        let dirs = ProjectDirs::from(ORG, AUTHOR, APP).ok_or(EngineError::MissingDirectories)?;
        let data_dir = dirs.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join("engine.toml");
        if !config_path.exists() {
            let initial = EngineConfig::default();
            fs::write(&config_path, toml::to_string_pretty(&initial)?)?;
        }

        Ok(Self { config_path, data_dir })
    }

    /// Builds a manager rooted at an arbitrary directory, bypassing
    /// `ProjectDirs` resolution entirely — used by tests and by hosts that
    /// manage their own data directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        let config_path = data_dir.join("engine.toml");
        if !config_path.exists() {
            let initial = EngineConfig::default();
            fs::write(&config_path, toml::to_string_pretty(&initial)?)?;
        }
        Ok(Self { config_path, data_dir })
    }

    pub fn load(&self) -> Result<EngineConfig, EngineError> {
        let content = fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, config: &EngineConfig) -> Result<(), EngineError> {
        fs::write(&self.config_path, toml::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn event_store_path(&self) -> PathBuf {
        self.data_dir.join("event-store.json")
    }

    pub fn template_preferences_path(&self) -> PathBuf {
        self.data_dir.join("template_preferences.json")
    }

    /// Opaque to the engine: round-tripped verbatim so the host's AI
    /// subsystem can own its own schema (spec §6, "Supplemented features").
    pub fn llm_config_path(&self) -> PathBuf {
        self.data_dir.join("llm-config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_creates_a_default_config_file_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::at(dir.path()).unwrap();
        assert!(manager.config_path().exists());
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.catchup_drain_batch_size, EngineConfig::default().catchup_drain_batch_size);
    }

    #[test]
    fn save_then_load_round_trips_an_edited_value() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::at(dir.path()).unwrap();
        let mut config = manager.load().unwrap();
        config.catchup_drain_batch_size = 42;
        manager.save(&config).unwrap();

        let reloaded = manager.load().unwrap();
        assert_eq!(reloaded.catchup_drain_batch_size, 42);
    }
}
