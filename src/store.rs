use {
    crate::{ByteView, Lru, OnEvict},
    parking_lot::Mutex,
};

/// Concurrency-safe wrapper around a single [`Lru`].
///
/// The underlying store is allocated on first insert. The lock is only held
/// for the map and list mutation itself, never across a load.
pub struct LocalStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    lru: Option<Lru>,
    on_evict: Option<OnEvict>,
}

impl LocalStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                lru: None,
                on_evict: None,
            }),
        }
    }

    /// Creates a store whose evictions are reported to `on_evict`.
    pub fn with_on_evict(capacity: usize, on_evict: OnEvict) -> Self {
        let store = Self::new(capacity);
        store.inner.lock().on_evict = Some(on_evict);
        store
    }

    /// Inserts or overwrites `key`, evicting as needed.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock();
        let capacity = self.capacity;
        let Inner { lru, on_evict } = &mut *inner;
        lru.get_or_insert_with(|| match on_evict.take() {
            Some(on_evict) => Lru::with_on_evict(capacity, on_evict),
            None => Lru::new(capacity),
        })
        .add(key, value);
    }

    /// Looks up `key`, promoting it on a hit.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().lru.as_mut()?.get(key)
    }

    /// Looks up `key` without promoting it.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().lru.as_ref()?.peek(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.as_ref().map_or(0, Lru::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> usize {
        self.inner.lock().lru.as_ref().map_or(0, Lru::used_bytes)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
