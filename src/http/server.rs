use {
    super::HttpPool,
    crate::{
        CacheError,
        CacheResult,
        KeyspaceRegistry,
        Response,
        protocol::CONTENT_TYPE,
    },
    axum::{
        Router,
        extract::State,
        http::{Method, StatusCode, Uri, header},
        response::IntoResponse,
    },
    percent_encoding::percent_decode_str,
    std::sync::Arc,
};

/// Serves the keyspaces of the current process to other peers.
///
/// Answers `GET {base_path}{keyspace}/{key}` with an encoded [`Response`].
pub struct PeerServer {
    self_addr: String,
    base_path: String,
    keyspaces: Arc<KeyspaceRegistry>,
}

impl PeerServer {
    /// Creates a server sharing the address and base path of `pool`.
    pub fn new(pool: &HttpPool, keyspaces: Arc<KeyspaceRegistry>) -> Self {
        Self {
            self_addr: pool.self_addr().to_owned(),
            base_path: pool.base_path().to_owned(),
            keyspaces,
        }
    }

    /// Splits a request path into its percent-decoded keyspace and key.
    pub fn parse_path(&self, path: &str) -> CacheResult<(String, String)> {
        let rest = path
            .strip_prefix(&self.base_path)
            .ok_or_else(|| CacheError::BadRequest(format!("unexpected path: {path}")))?;
        let malformed =
            || CacheError::BadRequest(format!("expected {}<keyspace>/<key>", self.base_path));

        let (keyspace, key) = rest.split_once('/').ok_or_else(malformed)?;
        if keyspace.is_empty() || key.is_empty() {
            return Err(malformed());
        }
        Ok((decode_segment(keyspace)?, decode_segment(key)?))
    }

    /// Looks up the value addressed by `path` and encodes it for the wire.
    pub async fn serve(&self, path: &str) -> CacheResult<Vec<u8>> {
        let (name, key) = self.parse_path(path)?;
        let keyspace = self
            .keyspaces
            .get(&name)
            .ok_or(CacheError::UnknownKeyspace(name))?;
        let value = keyspace.get(&key).await?;
        Response {
            value: value.to_vec(),
        }
        .encode()
    }

    /// Router handling every path, meant to be mounted as a whole service.
    pub fn router(self) -> Router {
        Router::new()
            .fallback(handle_peer_request)
            .with_state(Arc::new(self))
    }
}

async fn handle_peer_request(
    State(server): State<Arc<PeerServer>>,
    method: Method,
    uri: Uri,
) -> axum::response::Response {
    tracing::debug!(peer = %server.self_addr, %method, path = uri.path(), "peer request");
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response();
    }
    match server.serve(uri.path()).await {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(err) => err.into_response(),
    }
}

fn decode_segment(segment: &str) -> CacheResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CacheError::BadRequest(format!("invalid path segment {segment:?}: {e}")))
}

impl IntoResponse for CacheError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
