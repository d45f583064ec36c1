use {
    super::{ByteView, Keyspace, LocalStore, OnEvict, PeerPicker, Source},
    std::sync::Arc,
};

/// Keyspace builder.
pub struct KeyspaceBuilder {
    name: String,
    capacity: usize,
    source: Arc<dyn Source>,
    peers: Option<Arc<dyn PeerPicker>>,
    on_evict: Option<OnEvict>,
}

impl KeyspaceBuilder {
    /// Create new keyspace builder.
    ///
    /// `capacity` bounds the local store in bytes, counting both keys and
    /// values.
    pub fn new(name: impl Into<String>, capacity: usize, source: impl Source + 'static) -> Self {
        Self {
            name: name.into(),
            capacity,
            source: Arc::new(source),
            peers: None,
            on_evict: None,
        }
    }

    /// Route lookups through the given peers.
    ///
    /// Without peers every key is loaded from the local source.
    pub fn peers(mut self, peers: Arc<dyn PeerPicker>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Report entries evicted from the local store.
    pub fn on_evict<F>(mut self, on_evict: F) -> Self
    where
        F: FnMut(&str, &ByteView) + Send + 'static,
    {
        self.on_evict = Some(Box::new(on_evict));
        self
    }

    /// Build the keyspace.
    pub fn build(self) -> Keyspace {
        let store = match self.on_evict {
            Some(on_evict) => LocalStore::with_on_evict(self.capacity, on_evict),
            None => LocalStore::new(self.capacity),
        };
        Keyspace::from_parts(self.name, store, self.source, self.peers)
    }
}
