//! Peer-to-peer read-through cache.
//!
//! Every process of a fleet runs the same set of [`Keyspace`]s. A key is
//! owned by exactly one peer, chosen by consistent hashing over the peer set.
//! Looking a key up consults the local store first; on a miss the key is
//! either fetched from its owner or, when the current process owns it,
//! loaded from the [`Source`] and kept in the bounded local store.
//!
//! ```no_run
//! use {
//!     peercache::{HttpPool, Keyspace, KeyspaceBuilder, SourceError, SourceFn},
//!     std::sync::Arc,
//! };
//!
//! # async fn run() -> peercache::CacheResult<()> {
//! let pool = Arc::new(HttpPool::new("http://localhost:8001"));
//! pool.set_peers(["http://localhost:8001", "http://localhost:8002"]);
//!
//! let source = SourceFn::new(|key: &str| -> Result<Vec<u8>, SourceError> {
//!     Err(format!("{key} not exist").into())
//! });
//! let scores: Keyspace = KeyspaceBuilder::new("scores", 2 << 10, source)
//!     .peers(pool)
//!     .build();
//! let value = scores.get("Tom").await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

mod builder;
mod byteview;
mod coalesce;
mod error;
mod hash;
pub mod http;
mod keyspace;
mod lru;
mod peers;
pub mod protocol;
mod ring;
mod source;
mod store;

pub use {
    builder::KeyspaceBuilder,
    byteview::ByteView,
    coalesce::Coalescer,
    error::{CacheError, CacheResult},
    hash::{Crc32, Rapid, RingHash},
    http::{HttpGetter, HttpPool, HttpPoolBuilder, PeerServer, PoolConfig, api_router},
    keyspace::{Keyspace, KeyspaceRegistry},
    lru::{Lru, OnEvict},
    peers::{Connect, PeerGetter, PeerPicker, PeerRegistry},
    protocol::{Request, Response},
    ring::{DEFAULT_REPLICAS, HashRing},
    source::{Source, SourceError, SourceFn},
    store::LocalStore,
};
