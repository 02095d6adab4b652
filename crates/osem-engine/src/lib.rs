//! The crate most embedding hosts depend on: re-exports the store, matching,
//! catch-up, and adapter crates behind one facade, plus the ambient
//! persistence/config layer that ties their on-disk documents together
//! (spec §4.5, §4.6, §6). Mirrors `cove-email` sitting atop
//! `cove-core`/`cove-storage` in the teacher workspace.

pub mod config;
pub mod error;
pub mod facade;
pub mod llm_config;
pub mod manager;
pub mod pref_store;
pub mod template_pref;

pub use config::EngineConfig;
pub use error::EngineError;
pub use facade::IngestionFacade;
pub use manager::ConfigManager;
pub use pref_store::PreferenceStore;
pub use template_pref::TemplatePreferenceResolver;

pub use osem_adapter::{AdapterError, FilterExpr, FolderKind, MailSourceAdapter, SearchScope};
pub use osem_catchup::{CatchupEngine, CatchupTuning};
pub use osem_core::{Attachment, ChangeReason, Event, EventChanged, EventStatus, MailSnapshot, StoreError};
pub use osem_match::{Candidate, ClassifyResult, MatchConfig, MatchReason};
pub use osem_store::EventStore;

use std::sync::Arc;

/// Wires one fully-constructed engine from a `ConfigManager` and a
/// mail-source adapter — the single call an embedding host needs to get an
/// `IngestionFacade` and a running catch-up engine.
pub async fn bootstrap(
    manager: &ConfigManager,
    adapter: Arc<dyn MailSourceAdapter>,
) -> Result<(IngestionFacade, Arc<CatchupEngine>), EngineError> {
    let config = manager.load()?;
    let store = EventStore::open(manager.event_store_path()).await?;
    let catchup = CatchupEngine::with_tuning(store.clone(), adapter.clone(), config.catchup_tuning());
    catchup.spawn_background_tasks();
    let templates = TemplatePreferenceResolver::open(manager.template_preferences_path()).await?;
    let facade = IngestionFacade::new(store, adapter, catchup.clone(), templates);
    Ok((facade, catchup))
}
