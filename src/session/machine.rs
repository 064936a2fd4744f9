//! Shared session automaton
//!
//! One instance per deployment: every consumer drives the same session and
//! every producer receives the resulting commands. Transitions are serialized
//! by a single lock, so of two racing directives from `Idle` only the first
//! to take the lock succeeds.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::directive::{ControlDirective, ProducerCommand};
use super::error::SessionError;
use super::state::SessionPhase;
use crate::protocol::OutboundMessage;
use crate::router::{DeliveryReport, GroupName, GroupRouter};

/// Outcome of an accepted directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the directive
    pub from: SessionPhase,
    /// Phase after the directive
    pub to: SessionPhase,
    /// Command sent to producers
    pub command: ProducerCommand,
    /// Fan-out result for the command
    pub delivery: DeliveryReport,
}

/// The session state machine
pub struct SessionMachine {
    phase: Mutex<SessionPhase>,
    router: Arc<GroupRouter>,
}

impl SessionMachine {
    /// Create a machine in `Idle`
    pub fn new(router: Arc<GroupRouter>) -> Self {
        Self {
            phase: Mutex::new(SessionPhase::Idle),
            router,
        }
    }

    /// Current phase
    pub async fn phase(&self) -> SessionPhase {
        *self.phase.lock().await
    }

    /// Validate `directive` against the current phase and forward the
    /// resulting command to producers
    ///
    /// The transition is checked first, then producer presence. Rejected
    /// directives never reach producers. The lock is held across the fan-out
    /// so producers see commands in transition order.
    pub async fn apply(&self, directive: ControlDirective) -> Result<Transition, SessionError> {
        let mut phase = self.phase.lock().await;
        let from = *phase;

        let (to, command) = from
            .next(directive)
            .ok_or(SessionError::InvalidTransition { from, directive })?;

        if !self.router.has_members(GroupName::Producers).await {
            return Err(SessionError::NoProducerAvailable(directive));
        }

        *phase = to;
        let delivery = self
            .router
            .deliver(GroupName::Producers, OutboundMessage::Command(command))
            .await;

        tracing::info!(
            directive = %directive,
            from = %from,
            to = %to,
            producers = delivery.delivered,
            "Session transition"
        );

        Ok(Transition {
            from,
            to,
            command,
            delivery,
        })
    }

    /// Force the session back to `Idle`, returns the previous phase
    pub async fn reset(&self) -> SessionPhase {
        let mut phase = self.phase.lock().await;
        let previous = std::mem::replace(&mut *phase, SessionPhase::Idle);

        if previous != SessionPhase::Idle {
            tracing::info!(from = %previous, "Session reset to idle");
        }

        previous
    }

    /// Reset to `Idle` only if the producer group is empty
    ///
    /// Producer presence is checked under the session lock, so a producer
    /// that joined and was commanded before the lock was taken keeps its
    /// session. Returns the previous phase when a reset happened.
    pub async fn reset_if_no_producers(&self) -> Option<SessionPhase> {
        let mut phase = self.phase.lock().await;

        if self.router.has_members(GroupName::Producers).await {
            tracing::debug!(phase = %*phase, "Producer present, session kept");
            return None;
        }

        let previous = std::mem::replace(&mut *phase, SessionPhase::Idle);
        if previous != SessionPhase::Idle {
            tracing::info!(from = %previous, "Session reset to idle");
        }

        Some(previous)
    }
}
