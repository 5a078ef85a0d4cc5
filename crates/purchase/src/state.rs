//! Purchase state machine.

use common::{ConcertId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::PurchaseError;

/// The state of one purchase attempt.
///
/// State transitions:
/// ```text
/// Requested ──► ConcertResolved ──► TicketsReserved ──► PaymentCharged ──► OrderFinalized
///     │               │                    │                  │
///     └───────────────┴────────────────────┴──────────────────┴──► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PurchaseState {
    #[default]
    Requested,
    ConcertResolved,
    TicketsReserved,
    PaymentCharged,
    /// The order is paid for and returned (terminal state).
    OrderFinalized,
    /// The attempt failed; any reservation has been undone (terminal state).
    Rejected,
}

impl PurchaseState {
    /// Returns true if `next` directly follows this state.
    pub fn can_transition_to(&self, next: PurchaseState) -> bool {
        use PurchaseState::*;
        match (self, next) {
            (Requested, ConcertResolved)
            | (ConcertResolved, TicketsReserved)
            | (TicketsReserved, PaymentCharged)
            | (PaymentCharged, OrderFinalized) => true,
            (from, Rejected) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::OrderFinalized | PurchaseState::Rejected)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseState::Requested => "Requested",
            PurchaseState::ConcertResolved => "ConcertResolved",
            PurchaseState::TicketsReserved => "TicketsReserved",
            PurchaseState::PaymentCharged => "PaymentCharged",
            PurchaseState::OrderFinalized => "OrderFinalized",
            PurchaseState::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress record of one purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseAttempt {
    pub concert_id: ConcertId,
    pub ticket_quantity: u32,
    state: PurchaseState,
    order_id: Option<OrderId>,
    failure: Option<String>,
}

impl PurchaseAttempt {
    pub fn new(concert_id: ConcertId, ticket_quantity: u32) -> Self {
        Self {
            concert_id,
            ticket_quantity,
            state: PurchaseState::Requested,
            order_id: None,
            failure: None,
        }
    }

    pub fn state(&self) -> PurchaseState {
        self.state
    }

    /// The order created for this attempt, once tickets are reserved.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Moves to `next`, logging the step.
    pub fn advance(&mut self, next: PurchaseState) -> Result<(), PurchaseError> {
        if !self.state.can_transition_to(next) {
            return Err(PurchaseError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::info!(
            concert_id = %self.concert_id,
            order_id = ?self.order_id,
            from = %self.state,
            to = %next,
            "purchase step"
        );
        self.state = next;
        Ok(())
    }

    /// Records the order id and moves to `TicketsReserved`.
    pub fn reserved(&mut self, order_id: OrderId) -> Result<(), PurchaseError> {
        self.order_id = Some(order_id);
        self.advance(PurchaseState::TicketsReserved)
    }

    /// Moves to `Rejected` with a reason. No-op once terminal.
    pub fn reject(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }

        let reason = reason.into();
        tracing::warn!(
            concert_id = %self.concert_id,
            order_id = ?self.order_id,
            from = %self.state,
            %reason,
            "purchase rejected"
        );
        self.state = PurchaseState::Rejected;
        self.failure = Some(reason);
    }
}
