use thiserror::Error;

/// The adapter failure taxonomy of spec §7. The facade never propagates
/// these: transient failures feed the deferred-retry queue, permanent ones
/// mark the message-id as not-found.
#[derive(Debug, Error, Clone)]
pub enum AdapterError {
    #[error("mail source session unavailable")]
    SessionUnavailable,
    #[error("transient mail source failure: {0}")]
    Transient(String),
    #[error("message permanently missing from mail source")]
    PermanentMissing,
    #[error("mail source error: {0}")]
    Other(String),
}

impl AdapterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::SessionUnavailable | AdapterError::Transient(_))
    }
}
