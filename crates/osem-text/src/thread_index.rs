use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Re-encodes the first 27 bytes of a base64 thread-index token — the
/// root-anchor of the conversation (spec Glossary). An empty input yields an
/// empty prefix.
pub fn thread_index_prefix(raw_b64: &str) -> String {
    if raw_b64.is_empty() {
        return String::new();
    }
    let Ok(bytes) = STANDARD.decode(raw_b64) else {
        return String::new();
    };
    let prefix_len = bytes.len().min(27);
    STANDARD.encode(&bytes[..prefix_len])
}
