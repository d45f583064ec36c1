use {
    axum::http::StatusCode,
    std::{error::Error, sync::Arc},
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Empty key passed to a lookup.
    #[error("key is required")]
    InvalidKey,

    /// The authoritative source could not produce the value.
    #[error("source failure: {0}")]
    Source(#[source] Arc<dyn Error + Send + Sync>),

    /// Network error or non-OK status from a remote peer.
    #[error("peer {peer} failed: {reason}")]
    PeerTransport { peer: String, reason: String },

    /// Peer returned bytes that do not decode into a response.
    #[error("decoding response body: {0}")]
    Decode(String),

    /// Value could not be serialized for the wire.
    #[error("encoding response body: {0}")]
    Encode(String),

    /// No keyspace registered under the requested name.
    #[error("no such keyspace: {0}")]
    UnknownKeyspace(String),

    /// Inbound request path is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// `.` and `..` are dropped by URL normalization, so such keys and
    /// keyspace names cannot be fetched from a remote peer.
    #[error("cannot address {0:?} in a peer url")]
    UnaddressableKey(String),

    /// Keyspace names are unique within a registry.
    #[error("keyspace already registered: {0}")]
    DuplicateKeyspace(String),
}

impl CacheError {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::BadRequest(_)
            | CacheError::InvalidKey
            | CacheError::UnaddressableKey(_) => StatusCode::BAD_REQUEST,
            CacheError::UnknownKeyspace(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
