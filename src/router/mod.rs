//! Group routing and fan-out
//!
//! Connections are placed in one of two groups, `producers` or `consumers`.
//! Every outbound message addressed by the relay core goes to a whole group;
//! the router snapshots membership and pushes into each member's bounded
//! outbound queue.
//!
//! ```text
//!                 GroupRouter
//!        ┌─────────────┴─────────────┐
//!   producers: RwLock<..>      consumers: RwLock<..>
//!        │                           │
//!   [mpsc::Sender] ...         [mpsc::Sender] ...
//!        │                           │
//!   writer task ──► socket     writer task ──► socket
//! ```
//!
//! `OutboundMessage` clones are cheap: chunk payloads are `bytes::Bytes`.

pub mod delivery;
pub mod group;
pub mod store;

pub use delivery::DeliveryReport;
pub use group::{Group, GroupName, PeerSender};
pub use store::{GroupRouter, DEFAULT_DELIVERY_TIMEOUT};
