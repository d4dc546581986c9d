//! # notihub
//!
//! `notihub` is a real-time notification broker behind a WebSocket gateway:
//! clients open persistent connections, subscribe to named topics, and later
//! receive push notifications when an internal publisher publishes an event
//! matching a topic they subscribe to.
//!
//! ## Core Modules
//!
//! - `registry`: the durable connection registry (connection id → subscription
//!   set) and its subscription index.
//! - `broker`: connection lifecycle, subscription management, and the fan-out
//!   notifier with per-target failure isolation.
//! - `transport`: the WebSocket gateway and the swappable delivery transports
//!   (in-process push, HTTP callback).
//! - `api`: the HTTP surface internal publishers use to trigger a fan-out.
//! - `config`: configuration loading and validation.
//! - `utils`: error taxonomy and logging setup.

pub mod api;
pub mod broker;
pub mod config;
pub mod registry;
pub mod transport;
pub mod utils;
