//! The `transport` module handles network communication with clients.
//!
//! It hosts the WebSocket gateway (connection accept loop, control-frame
//! parsing, disconnect cleanup) and the `DeliveryTransport` seam the broker
//! pushes notifications through. Two realizations exist: the in-process
//! gateway push and an HTTP callback, selected by configuration.

pub mod callback;
pub mod delivery;
pub mod gateway;
pub mod message;

pub use delivery::{DeliveryError, DeliveryTransport};
