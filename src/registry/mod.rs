//! The `registry` module is the connection registry: a durable table mapping
//! each live connection id to the set of topics it subscribes to.
//!
//! It is the sole owner of connection records. The subscription index
//! (`ConnectionStore::subscribers_of`) is a read-only projection over the
//! same table, never independently mutated.
//!
//! Backed by `sled` for durable storage across process restarts.

pub mod store;

pub use store::{ConnectionRecord, ConnectionStore};
