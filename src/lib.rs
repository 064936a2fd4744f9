//! Real-time relay between capture devices and viewer clients
//!
//! Capture devices (producers) and viewer clients (consumers) connect over
//! WebSocket and never learn each other's network identity. Viewers drive a
//! single shared capture/streaming session; producers push sequence-numbered
//! image chunks which are fanned out to every viewer.
//!
//! # Architecture
//!
//! ```text
//!   [Producer] ──chunks──►┐                       ┌──► [Consumer]
//!                         │      RelayHub         │
//!   [Consumer] ─directive─┤  registry ─ router ───┼──► [Consumer]
//!                         │  session  ─ relay     │
//!   [Producer] ◄─command──┘                       └──► [Consumer]
//! ```
//!
//! - [`registry`] tracks live connections and their role
//! - [`router`] owns the `producers`/`consumers` groups and performs fan-out
//! - [`session`] validates control directives against the shared session
//! - [`relay`] validates and forwards frame chunks without buffering them
//! - [`server`] is the WebSocket transport that feeds [`RelayHub`]

pub mod error;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod router;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use hub::RelayHub;
pub use registry::{ConnectionId, RegistryConfig, Role};
pub use router::{DeliveryReport, GroupName};
pub use server::{RelayServer, ServerConfig};
pub use session::{ControlDirective, SessionPhase};
