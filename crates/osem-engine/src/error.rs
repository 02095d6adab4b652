use thiserror::Error;

/// Aggregates every failure an embedding host can see from this crate,
/// matching `aether-email::EmailError::Storage(#[from] aether_storage::StorageError)`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] osem_core::StoreError),
    #[error("no project directories could be resolved for this platform")]
    MissingDirectories,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
