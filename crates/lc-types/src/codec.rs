//! Payload codec
//!
//! Headers, blocks, transactions and accounts travel as bincode payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Encoding or decoding failure
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),
    /// Bytes did not decode to the expected type.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Encode a value for the wire or the header store.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a value received from the wire or read from the header store.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
