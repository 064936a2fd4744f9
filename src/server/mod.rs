//! WebSocket transport
//!
//! Accepts connections, classifies them from the handshake query string and
//! feeds decoded frames to the [`RelayHub`](crate::hub::RelayHub).

pub mod config;
mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
