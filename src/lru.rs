use {
    crate::ByteView,
    std::collections::{HashMap, VecDeque},
};

/// Callback invoked with every entry the store evicts.
pub type OnEvict = Box<dyn FnMut(&str, &ByteView) + Send>;

/// Slot index of an entry.
type SlotIdx = usize;

struct Entry {
    key: String,
    value: ByteView,
    /// Towards the most recently used end.
    prev: Option<SlotIdx>,
    /// Towards the least recently used end.
    next: Option<SlotIdx>,
}

impl Entry {
    /// Accounted size of the entry.
    fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

/// Least-recently-used store bounded by total byte size.
///
/// Entries live in a slot arena and are linked into a recency list, with
/// `head` being the most recently used entry. An index maps every resident
/// key to its slot. The size of an entry is the length of its key plus the
/// length of its value; the sum over all resident entries never exceeds
/// `capacity` once an operation returns.
///
/// The store is not synchronized, see [`LocalStore`](crate::LocalStore) for
/// the shared version.
pub struct Lru {
    capacity: usize,
    used: usize,
    index: HashMap<String, SlotIdx>,
    slots: Vec<Option<Entry>>,

    /// Slots vacated by evictions, reused before the arena grows.
    free_list: VecDeque<SlotIdx>,

    head: Option<SlotIdx>,
    tail: Option<SlotIdx>,
    on_evict: Option<OnEvict>,
}

impl Lru {
    /// Creates an empty store holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            index: HashMap::new(),
            slots: Vec::new(),
            free_list: VecDeque::new(),
            head: None,
            tail: None,
            on_evict: None,
        }
    }

    /// Creates an empty store that reports evicted entries to `on_evict`.
    ///
    /// The callback observes evictions only, it does not affect their order.
    pub fn with_on_evict(capacity: usize, on_evict: OnEvict) -> Self {
        Self {
            on_evict: Some(on_evict),
            ..Self::new(capacity)
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.slots[idx].as_ref().map(|entry| entry.value.clone())
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|entry| entry.value.clone())
    }

    /// Inserts or overwrites `key`, then evicts least recently used entries
    /// until the store fits its capacity again.
    ///
    /// An entry larger than the whole capacity is evicted right away.
    pub fn add(&mut self, key: impl Into<String>, value: ByteView) {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = self.slots[idx].as_mut() {
                self.used = self.used - entry.value.len() + value.len();
                entry.value = value;
            }
            self.promote(idx);
        } else {
            let entry = Entry {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used += entry.size();
            let idx = match self.free_list.pop_front() {
                Some(idx) => {
                    self.slots[idx] = Some(entry);
                    idx
                }
                None => {
                    self.slots.push(Some(entry));
                    self.slots.len() - 1
                }
            };
            self.index.insert(key, idx);
            self.push_front(idx);
        }

        while self.used > self.capacity {
            if !self.remove_oldest() {
                break;
            }
        }
    }

    /// Evicts the least recently used entry.
    ///
    /// Returns `false` if the store was empty.
    pub fn remove_oldest(&mut self) -> bool {
        let Some(idx) = self.tail else {
            return false;
        };
        self.unlink(idx);
        let Some(entry) = self.slots[idx].take() else {
            return false;
        };
        self.free_list.push_back(idx);
        self.index.remove(&entry.key);
        self.used -= entry.size();
        tracing::debug!(key = %entry.key, size = entry.size(), "evicted");

        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&entry.key, &entry.value);
        }
        true
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sum of accounted sizes of resident entries.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn promote(&mut self, idx: SlotIdx) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: SlotIdx) {
        let old_head = self.head;
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head.and_then(|head| self.slots[head].as_mut()) {
            Some(head) => head.prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: SlotIdx) {
        let Some((prev, next)) = self.slots[idx].as_ref().map(|e| (e.prev, e.next)) else {
            return;
        };
        match prev.and_then(|prev| self.slots[prev].as_mut()) {
            Some(prev) => prev.next = next,
            None => self.head = next,
        }
        match next.and_then(|next| self.slots[next].as_mut()) {
            Some(next) => next.prev = prev,
            None => self.tail = prev,
        }
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{Arc, Mutex},
    };

    /// Keys from most to least recently used.
    fn recency(lru: &Lru) -> Vec<String> {
        let mut keys = vec![];
        let mut cursor = lru.head;
        while let Some(idx) = cursor {
            let entry = lru.slots[idx].as_ref().unwrap();
            keys.push(entry.key.clone());
            cursor = entry.next;
        }
        keys
    }

    fn check_consistency(lru: &Lru) {
        let keys = recency(lru);
        assert_eq!(keys.len(), lru.index.len());
        for key in &keys {
            let idx = lru.index[key];
            assert_eq!(&lru.slots[idx].as_ref().unwrap().key, key);
        }
        let used: usize = keys
            .iter()
            .map(|k| k.len() + lru.peek(k).unwrap().len())
            .sum();
        assert_eq!(used, lru.used);
        assert!(lru.used <= lru.capacity);
    }

    #[test]
    fn get_and_add() {
        let mut lru = Lru::new(1024);
        lru.add("key1", ByteView::from("1234"));

        assert_eq!(lru.get("key1").unwrap().to_string(), "1234");
        assert!(lru.get("key2").is_none());
        assert_eq!(lru.used_bytes(), 8);
        check_consistency(&lru);
    }

    #[test]
    fn overwrite_updates_size() {
        let mut lru = Lru::new(1024);
        lru.add("key", ByteView::from("1"));
        lru.add("key", ByteView::from("12345"));

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.used_bytes(), 8);
        assert_eq!(lru.peek("key").unwrap().to_string(), "12345");
        check_consistency(&lru);
    }

    #[test]
    fn evicts_least_recent() {
        let (k1, k2, k3) = ("key1", "key2", "k3");
        let (v1, v2, v3) = ("value1", "value2", "v3");
        let capacity = k1.len() + k2.len() + v1.len() + v2.len();
        let mut lru = Lru::new(capacity);
        lru.add(k1, ByteView::from(v1));
        lru.add(k2, ByteView::from(v2));
        lru.add(k3, ByteView::from(v3));

        assert!(lru.get(k1).is_none());
        assert_eq!(lru.len(), 2);
        check_consistency(&lru);
    }

    #[test]
    fn get_promotes() {
        let mut lru = Lru::new(12);
        lru.add("a", ByteView::from("111"));
        lru.add("b", ByteView::from("222"));
        lru.add("c", ByteView::from("333"));
        assert_eq!(recency(&lru), ["c", "b", "a"]);

        lru.get("a");
        assert_eq!(recency(&lru), ["a", "c", "b"]);

        // "b" is now the oldest entry.
        lru.add("d", ByteView::from("444"));
        assert_eq!(recency(&lru), ["d", "a", "c"]);

        // Peeking does not promote.
        lru.peek("c");
        lru.add("e", ByteView::from("555"));
        assert_eq!(recency(&lru), ["e", "d", "a"]);
        check_consistency(&lru);
    }

    #[test]
    fn oversized_entry_leaves_store_empty() {
        let mut lru = Lru::new(4);
        lru.add("ab", ByteView::from("cd"));
        lru.add("huge", ByteView::from("value"));

        assert!(lru.is_empty());
        assert_eq!(lru.used_bytes(), 0);
        check_consistency(&lru);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut lru = Lru::new(0);
        lru.add("k", ByteView::default());
        lru.add("", ByteView::from("v"));
        assert!(lru.is_empty());
    }

    #[test]
    fn on_evict_callback() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let mut lru = Lru::with_on_evict(
            10,
            Box::new(move |key, _value| sink.lock().unwrap().push(key.to_string())),
        );
        lru.add("key1", ByteView::from("123456"));
        lru.add("k2", ByteView::from("k2"));
        lru.add("k3", ByteView::from("k3"));
        lru.add("k4", ByteView::from("k4"));

        assert_eq!(*evicted.lock().unwrap(), ["key1", "k2"]);
    }

    #[test]
    fn capacity_holds_across_inserts() {
        let mut lru = Lru::new(64);
        for i in 0..500 {
            let key = format!("key{}", i % 37);
            let value = "x".repeat(i % 23);
            lru.add(key, ByteView::from(value.as_str()));
            if i % 3 == 0 {
                lru.get(&format!("key{}", (i * 7) % 37));
            }
            check_consistency(&lru);
        }
        // Freed slots are reused instead of growing the arena.
        assert!(lru.slots.len() <= 37);
    }
}
