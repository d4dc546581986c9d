//! The `broker` module drives the connection registry: it handles connect and
//! disconnect events, applies client subscription changes, and fans published
//! notifications out to every subscribed connection with per-target failure
//! isolation.

pub mod engine;
pub mod message;

pub use engine::Broker;
