//! Payload codecs
//!
//! The store only ever sees bytes. A codec turns a job's return value (or its
//! failure descriptor, as JSON) into those bytes and back.

use crate::{ResultError, Result};

/// Encodes and decodes stored payloads
pub trait ResultCodec: Send + Sync + 'static {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>>;

    /// Decode stored bytes. The error string describes why the payload is
    /// unreadable; the caller turns it into a corrupt-result condition.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, String>;
}

/// UTF-8 JSON codec (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ResultCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| ResultError::Serialization(format!("Failed to encode result: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, String> {
        serde_json::from_slice(bytes).map_err(|e| format!("Failed to decode result: {}", e))
    }
}
