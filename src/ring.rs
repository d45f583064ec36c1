
use {
    crate::{Crc32, RingHash},
    std::collections::HashMap,
};

/// Default number of virtual nodes per peer.
pub const DEFAULT_REPLICAS: usize = 50;

/// Consistent hash ring.
///
/// Each peer is placed on the ring `replicas` times, under the names
/// `"0{peer}"`, `"1{peer}"`, ... Keys are routed to the owner of the first
/// virtual node at or after the key's hash, wrapping around past the largest
/// position. Virtual nodes smooth the distribution: adding or removing one
/// peer remaps roughly `1/peers` of the keys.
///
/// Rings are built once per peer set and never updated in place.
pub struct HashRing<H = Crc32> {
    hasher: H,
    replicas: usize,

    /// Sorted, de-duplicated virtual node positions.
    positions: Vec<u32>,

    /// Virtual node position to real peer.
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring using the default hash.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Crc32)
    }
}

impl<H: RingHash> HashRing<H> {
    /// Creates an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hasher: H) -> Self {
        Self {
            hasher,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds peers to the ring.
    ///
    /// Should two virtual nodes collide, the peer added last owns the
    /// position.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for peer in peers {
            let peer = peer.into();
            for i in 0..self.replicas {
                let position = self.hasher.hash(format!("{i}{peer}").as_bytes());
                self.positions.push(position);
                self.owners.insert(position, peer.clone());
            }
        }
        self.positions.sort_unstable();
        self.positions.dedup();
    }

    /// Returns the peer owning `key`, or `None` if the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = self.hasher.hash(key.as_bytes());
        let idx = self.positions.partition_point(|&position| position < hash);
        let position = self.positions[idx % self.positions.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}
