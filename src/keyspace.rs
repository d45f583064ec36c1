use {
    crate::{
        ByteView,
        CacheError,
        CacheResult,
        Coalescer,
        KeyspaceBuilder,
        LocalStore,
        PeerGetter,
        PeerPicker,
        Request,
        Source,
    },
    std::{collections::HashMap, sync::Arc},
};

/// Named cache over one slice of data.
///
/// A keyspace owns a bounded local store, the [`Source`] it fills the store
/// from, and optionally a [`PeerPicker`] telling which keys belong to other
/// processes. Lookups of keys owned by another peer are forwarded to it and
/// never stored locally, so the fleet holds one copy of every key.
pub struct Keyspace {
    name: String,
    store: LocalStore,
    source: Arc<dyn Source>,
    peers: Option<Arc<dyn PeerPicker>>,
    loader: Coalescer<String, ByteView, CacheError>,
}

impl Keyspace {
    /// Creates a standalone keyspace, see [`KeyspaceBuilder`] for options.
    pub fn new(name: impl Into<String>, capacity: usize, source: impl Source + 'static) -> Self {
        KeyspaceBuilder::new(name, capacity, source).build()
    }

    pub(crate) fn from_parts(
        name: String,
        store: LocalStore,
        source: Arc<dyn Source>,
        peers: Option<Arc<dyn PeerPicker>>,
    ) -> Self {
        Self {
            name,
            store,
            source,
            peers,
            loader: Coalescer::new(),
        }
    }

    /// Returns the value of `key`.
    ///
    /// Served from the local store if present. Otherwise the value is fetched
    /// from the owning peer, or loaded from the source and stored when this
    /// process owns the key. Concurrent misses on one key share a single
    /// fetch.
    pub async fn get(&self, key: &str) -> CacheResult<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        if let Some(value) = self.store.get(key) {
            tracing::trace!(keyspace = %self.name, key, "cache hit");
            return Ok(value);
        }
        self.load(key).await
    }

    async fn load(&self, key: &str) -> CacheResult<ByteView> {
        self.loader
            .run(key.to_owned(), || async {
                match self.peers.as_ref().and_then(|peers| peers.pick_peer(key)) {
                    Some(peer) => self.get_from_peer(peer.as_ref(), key).await,
                    None => self.get_locally(key).await,
                }
            })
            .await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> CacheResult<ByteView> {
        let request = Request::new(self.name.as_str(), key);
        match peer.get(&request).await {
            Ok(response) => Ok(ByteView::from(response.value)),
            Err(err) => {
                tracing::warn!(keyspace = %self.name, key, %err, "failed to get from peer");
                Err(err)
            }
        }
    }

    async fn get_locally(&self, key: &str) -> CacheResult<ByteView> {
        tracing::debug!(keyspace = %self.name, key, "loading from source");
        let bytes = self.source.load(key).await.map_err(|err| {
            tracing::warn!(keyspace = %self.name, key, %err, "source failed");
            CacheError::Source(Arc::from(err))
        })?;
        let value = ByteView::from(bytes);
        self.store.add(key, value.clone());
        Ok(value)
    }

    /// Returns the locally stored value of `key` without loading it or
    /// affecting its eviction order.
    pub fn cached(&self, key: &str) -> Option<ByteView> {
        self.store.peek(key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity of the local store in bytes.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }
}

/// Keyspaces of a process, by name.
///
/// Populated at startup, then shared read-only with whatever serves
/// requests.
#[derive(Default)]
pub struct KeyspaceRegistry {
    keyspaces: HashMap<String, Arc<Keyspace>>,
}

impl KeyspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyspace, failing if its name is taken.
    pub fn register(&mut self, keyspace: Keyspace) -> CacheResult<Arc<Keyspace>> {
        if self.keyspaces.contains_key(keyspace.name()) {
            return Err(CacheError::DuplicateKeyspace(keyspace.name().to_owned()));
        }
        let keyspace = Arc::new(keyspace);
        self.keyspaces
            .insert(keyspace.name().to_owned(), keyspace.clone());
        Ok(keyspace)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Keyspace>> {
        self.keyspaces.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.keyspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyspaces.is_empty()
    }
}
