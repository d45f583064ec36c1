use {
    crate::{CacheError, CacheResult, PeerGetter, Request, Response},
    async_trait::async_trait,
    percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode},
    reqwest::StatusCode,
};

/// Characters escaped in a path segment (RFC 3986 `pchar` complement).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Client for one remote peer.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    client: reqwest::Client,

    /// Peer address followed by the base path, e.g.
    /// `http://10.0.0.1:8001/_peercache/`.
    base_url: String,
}

impl HttpGetter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// URL addressing `request` on the peer.
    pub fn url(&self, request: &Request) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            utf8_percent_encode(&request.keyspace, SEGMENT),
            utf8_percent_encode(&request.key, SEGMENT),
        )
    }

    fn failure(&self, reason: impl ToString) -> CacheError {
        CacheError::PeerTransport {
            peer: self.base_url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, request: &Request) -> CacheResult<Response> {
        for segment in [&request.keyspace, &request.key] {
            if is_dot_segment(segment) {
                return Err(CacheError::UnaddressableKey(segment.clone()));
            }
        }

        let response = self
            .client
            .get(self.url(request))
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(self.failure(format!("server returned: {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.failure(format!("reading response body: {e}")))?;
        Response::decode(&body)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}
