use {auto_impl::auto_impl, rapidhash::v3::rapidhash_v3};

/// Hash function placing keys and virtual nodes on the ring.
///
/// Every process in a fleet must use the same function, so implementations
/// have to be stable across processes, platforms and releases.
#[auto_impl(&, Box, Arc)]
pub trait RingHash: Send + Sync {
    fn hash(&self, data: &[u8]) -> u32;
}

/// IEEE CRC-32 checksum.
///
/// Default ring hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32;

impl RingHash for Crc32 {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// Rapidhash V3 truncated to its lower 32 bits.
///
/// Relies on the default seed and secrets, so the output is portable across
/// platforms and major releases.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rapid;

impl RingHash for Rapid {
    fn hash(&self, data: &[u8]) -> u32 {
        rapidhash_v3(data) as u32
    }
}
