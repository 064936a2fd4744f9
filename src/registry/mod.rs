//! Connection registry
//!
//! Owns every live connection record and is the only writer of group
//! membership. A connection belongs to at most one group at a time:
//!
//! ```text
//!   register ──► Unassigned ──assign_role("raspberrypi")──► producers
//!                    │
//!                    └──────assign_role("flutter")──────► consumers
//!
//!   unregister ──► removed from its group (last producer ⇒ session reset)
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use connection::{Connection, ConnectionId, Role};
pub use error::RegistryError;
pub use store::ConnectionRegistry;
