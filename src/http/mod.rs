//! HTTP transport between peers.
//!
//! [`HttpPool`] routes keys to peers and hands out [`HttpGetter`] clients;
//! [`PeerServer`] answers `GET {base_path}{keyspace}/{key}` from other
//! peers. [`api_router()`] exposes a keyspace to ordinary clients.

mod api;
mod client;
mod pool;
mod server;

pub use {
    api::api_router,
    client::HttpGetter,
    pool::{DEFAULT_BASE_PATH, HttpPool, HttpPoolBuilder, PoolConfig},
    server::PeerServer,
};
