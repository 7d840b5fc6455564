//! # Serialization
//!
//! Two wire formats: a structured text format (`serde_json`) safe across
//! trust boundaries, and a richer binary format (MessagePack via
//! `rmp-serde`) for in-cluster deployments only.

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::{FastworkerError, FastworkerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    MessagePack,
}

impl SerializationFormat {
    pub fn from_env_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "msgpack" | "messagepack" | "binary" => Self::MessagePack,
            _ => Self::Json,
        }
    }
}

impl Default for SerializationFormat {
    fn default() -> Self {
        Self::Json
    }
}

/// Serialize `value` into bytes using `format`. The binary format is only
/// safe within a trusted cluster; each use logs a warning.
pub fn encode<T: Serialize>(value: &T, format: SerializationFormat) -> FastworkerResult<Vec<u8>> {
    match format {
        SerializationFormat::Json => {
            serde_json::to_vec(value).map_err(|e| FastworkerError::serialization(e.to_string()))
        }
        SerializationFormat::MessagePack => {
            warn!("encoding message with the binary format; only safe for in-cluster transport");
            rmp_serde::to_vec_named(value)
                .map_err(|e| FastworkerError::serialization(e.to_string()))
        }
    }
}

/// Deserialize `bytes` into `T` using `format`.
pub fn decode<T: DeserializeOwned>(
    bytes: &[u8],
    format: SerializationFormat,
) -> FastworkerResult<T> {
    match format {
        SerializationFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| FastworkerError::serialization(e.to_string()))
        }
        SerializationFormat::MessagePack => {
            warn!("decoding message with the binary format; only safe for in-cluster transport");
            rmp_serde::from_slice(bytes).map_err(|e| FastworkerError::serialization(e.to_string()))
        }
    }
}
