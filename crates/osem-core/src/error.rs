use thiserror::Error;

/// Errors the store propagates to callers (spec §7 "Propagation": the store
/// propagates `NotFound` and `Corrupt`; everything else is handled closer to
/// the edge that produced it).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event not found: {0}")]
    NotFound(String),
    #[error("snapshot missing conversation_id")]
    InvalidSnapshot,
    #[error("event store is corrupt: {0}")]
    Corrupt(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
