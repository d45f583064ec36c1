use {
    crate::{CacheResult, Crc32, DEFAULT_REPLICAS, HashRing, Request, Response, RingHash},
    async_trait::async_trait,
    auto_impl::auto_impl,
    parking_lot::Mutex,
    std::{collections::HashMap, sync::Arc},
};

/// Resolves the remote peer owning a key.
#[auto_impl(&, Box, Arc)]
pub trait PeerPicker: Send + Sync {
    /// Returns a handle to the peer owning `key`.
    ///
    /// `None` means the key is served locally: either no peers are known or
    /// the current process owns the key.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Fetches values from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, request: &Request) -> CacheResult<Response>;
}

/// Creates the fetch handle for a peer id.
pub type Connect = Box<dyn Fn(&str) -> Arc<dyn PeerGetter> + Send + Sync>;

/// Peer set, its ring and a fetch handle for every peer.
///
/// All three are replaced together by [`set_peers()`](Self::set_peers);
/// readers never see a ring built for one peer set and handles for another.
/// A handle obtained before a replacement stays usable for the call in
/// progress.
pub struct PeerRegistry {
    self_id: String,
    replicas: usize,
    hasher: Arc<dyn RingHash>,
    connect: Connect,
    peers: Mutex<Peers>,
}

struct Peers {
    ids: Vec<String>,
    ring: HashRing<Arc<dyn RingHash>>,
    getters: HashMap<String, Arc<dyn PeerGetter>>,
}

impl PeerRegistry {
    /// Creates an empty registry with the default ring settings.
    pub fn new(self_id: impl Into<String>, connect: Connect) -> Self {
        Self::with_ring(self_id, DEFAULT_REPLICAS, Arc::new(Crc32), connect)
    }

    /// Creates an empty registry with custom ring settings.
    pub fn with_ring(
        self_id: impl Into<String>,
        replicas: usize,
        hasher: Arc<dyn RingHash>,
        connect: Connect,
    ) -> Self {
        let peers = Peers {
            ids: Vec::new(),
            ring: HashRing::with_hasher(replicas, hasher.clone()),
            getters: HashMap::new(),
        };
        Self {
            self_id: self_id.into(),
            replicas,
            hasher,
            connect,
            peers: Mutex::new(peers),
        }
    }

    /// Replaces the peer set.
    ///
    /// `peers` is the full list of peers, the current process included.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = peers.into_iter().map(Into::into).collect();
        let mut ring = HashRing::with_hasher(self.replicas, self.hasher.clone());
        ring.add(ids.iter().cloned());
        let getters = ids
            .iter()
            .map(|id| (id.clone(), (self.connect)(id)))
            .collect();

        tracing::info!(peer = %self.self_id, peers = ids.len(), "peer set replaced");
        *self.peers.lock() = Peers { ids, ring, getters };
    }

    /// Returns the ring owner of `key`, which may be the current process.
    pub fn owner(&self, key: &str) -> Option<String> {
        self.peers.lock().ring.get(key).map(str::to_owned)
    }

    /// Current peer set.
    pub fn peers(&self) -> Vec<String> {
        self.peers.lock().ids.clone()
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }
}

impl PeerPicker for PeerRegistry {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let peers = self.peers.lock();
        let owner = peers.ring.get(key)?;
        if owner == self.self_id {
            return None;
        }
        tracing::debug!(peer = %self.self_id, owner, key, "picked remote peer");
        peers.getters.get(owner).cloned()
    }
}
