//! Session state machine
//!
//! Tracks the single capture/streaming session shared by all viewers and
//! producers, and turns viewer directives into producer commands.

pub mod directive;
pub mod error;
pub mod machine;
pub mod state;

pub use directive::{ControlDirective, ProducerCommand};
pub use error::SessionError;
pub use machine::{SessionMachine, Transition};
pub use state::SessionPhase;
