use {
    super::HttpGetter,
    crate::{Crc32, DEFAULT_REPLICAS, PeerGetter, PeerPicker, PeerRegistry, RingHash},
    serde::Deserialize,
    std::sync::Arc,
};

/// Path prefix of the peer endpoint.
pub const DEFAULT_BASE_PATH: &str = "/_peercache/";

/// Transport settings shared by every peer of a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Path prefix under which peers serve each other.
    pub base_path: String,

    /// Virtual nodes per peer on the hash ring.
    pub replicas: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_owned(),
            replicas: DEFAULT_REPLICAS,
        }
    }
}

/// Peers of the current process, reachable over HTTP.
///
/// Peers are identified by their base address, e.g. `http://10.0.0.1:8001`.
/// The current process must appear in the peer list under the same address
/// it was created with, so that it recognizes the keys it owns.
pub struct HttpPool {
    base_path: String,
    registry: PeerRegistry,
}

impl HttpPool {
    /// Creates a pool with default settings.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::builder(self_addr).build()
    }

    pub fn builder(self_addr: impl Into<String>) -> HttpPoolBuilder {
        HttpPoolBuilder::new(self_addr)
    }

    /// Replaces the peer set, see [`PeerRegistry::set_peers()`].
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.set_peers(peers)
    }

    pub fn self_addr(&self) -> &str {
        self.registry.self_id()
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn peers(&self) -> Vec<String> {
        self.registry.peers()
    }

    /// Address of the peer owning `key`, possibly the current process.
    pub fn owner(&self, key: &str) -> Option<String> {
        self.registry.owner(key)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        self.registry.pick_peer(key)
    }
}

/// HTTP pool builder.
pub struct HttpPoolBuilder {
    self_addr: String,
    config: PoolConfig,
    hasher: Arc<dyn RingHash>,
    client: Option<reqwest::Client>,
}

impl HttpPoolBuilder {
    /// Create new pool builder for the process at `self_addr`.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self {
            self_addr: self_addr.into(),
            config: PoolConfig::default(),
            hasher: Arc::new(Crc32),
            client: None,
        }
    }

    /// Take base path and replicas from a loaded configuration.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    pub fn replicas(mut self, replicas: usize) -> Self {
        self.config.replicas = replicas;
        self
    }

    /// Ring hash, identical across the fleet.
    pub fn hasher(mut self, hasher: impl RingHash + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// HTTP client used for peer fetches.
    ///
    /// No timeout is applied by default; configure one on the client to bound
    /// peer calls.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the pool.
    pub fn build(self) -> HttpPool {
        let base_path = normalize_base_path(&self.config.base_path);
        let client = self.client.unwrap_or_default();
        let prefix = base_path.clone();
        let connect = Box::new(move |peer: &str| {
            Arc::new(HttpGetter::new(client.clone(), format!("{peer}{prefix}")))
                as Arc<dyn PeerGetter>
        });
        let registry =
            PeerRegistry::with_ring(self.self_addr, self.config.replicas, self.hasher, connect);
        HttpPool {
            base_path,
            registry,
        }
    }
}

/// Ensures the base path starts and ends with a slash.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}
