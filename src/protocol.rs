//! Peer wire protocol.
//!
//! A peer asks another peer for `{keyspace, key}` and gets back a
//! [`Response`] carrying the value. Responses travel as bincode using the
//! standard configuration: compact, unversioned, and exact for any byte
//! payload including empty ones and ones with zero bytes.

use {
    crate::{CacheError, CacheResult},
    bincode::config,
    serde::{Deserialize, Serialize},
};

/// Content type of encoded responses.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Fetch request sent to the peer owning `key`.
///
/// Travels as the `{keyspace}/{key}` path of the peer URL, never as a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub keyspace: String,
    pub key: String,
}

impl Request {
    pub fn new(keyspace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            key: key.into(),
        }
    }
}

/// Value returned by the owning peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub value: Vec<u8>,
}

impl Response {
    pub fn encode(&self) -> CacheResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, config::standard())
            .map_err(|e| CacheError::Encode(e.to_string()))
    }

    /// Decodes a response, rejecting trailing garbage.
    pub fn decode(bytes: &[u8]) -> CacheResult<Self> {
        let (response, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, config::standard())
                .map_err(|e| CacheError::Decode(e.to_string()))?;
        if read != bytes.len() {
            return Err(CacheError::Decode(format!(
                "{} trailing bytes",
                bytes.len() - read
            )));
        }
        Ok(response)
    }
}
