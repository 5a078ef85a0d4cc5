//! Purchase error types.

use common::{ConcertId, OrderId};
use domain::DomainError;
use thiserror::Error;

use crate::payment::PaymentError;
use crate::state::PurchaseState;

/// Errors that can end a purchase attempt.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// The requested ticket quantity is zero.
    #[error("Ticket quantity must be at least 1")]
    InvalidQuantity,

    /// The order request is malformed.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// The concert does not exist or is not published.
    #[error("Concert not found: {0}")]
    ConcertNotFound(ConcertId),

    /// The concert has fewer available tickets than requested.
    #[error(
        "Not enough tickets for concert {concert_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        concert_id: ConcertId,
        requested: u32,
        available: u32,
    },

    /// The gateway rejected the payment token.
    #[error("Invalid payment token")]
    InvalidToken,

    /// The gateway could not process the charge.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The order could not be rolled back after a failed charge.
    #[error("Compensation for order {order_id} failed: {reason}")]
    CompensationFailed { order_id: OrderId, reason: String },

    /// The attempt tried to move between two states that are not adjacent.
    #[error("Invalid purchase transition: {from} -> {to}")]
    InvalidTransition {
        from: PurchaseState,
        to: PurchaseState,
    },

    /// An unexpected storage failure.
    #[error("Storage error: {0}")]
    Storage(DomainError),
}

impl PurchaseError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PurchaseError::InvalidQuantity => "invalid_quantity",
            PurchaseError::InvalidOrder(_) => "invalid_order",
            PurchaseError::ConcertNotFound(_) => "concert_not_found",
            PurchaseError::InsufficientInventory { .. } => "insufficient_inventory",
            PurchaseError::InvalidToken => "invalid_token",
            PurchaseError::PaymentFailed(_) => "payment_failed",
            PurchaseError::CompensationFailed { .. } => "compensation_failed",
            PurchaseError::InvalidTransition { .. } => "invalid_transition",
            PurchaseError::Storage(_) => "storage",
        }
    }
}

impl From<DomainError> for PurchaseError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ConcertNotFound(id) => PurchaseError::ConcertNotFound(id),
            DomainError::InsufficientInventory {
                concert_id,
                requested,
                available,
            } => PurchaseError::InsufficientInventory {
                concert_id,
                requested,
                available,
            },
            DomainError::InvalidOrder(reason) => PurchaseError::InvalidOrder(reason),
            other => PurchaseError::Storage(other),
        }
    }
}

impl From<PaymentError> for PurchaseError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidToken => PurchaseError::InvalidToken,
            PaymentError::Unavailable(reason) => PurchaseError::PaymentFailed(reason),
        }
    }
}

/// Convenience type alias for purchase results.
pub type Result<T> = std::result::Result<T, PurchaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_outcomes() {
        let err = PurchaseError::from(DomainError::ConcertNotFound(ConcertId::new(3)));
        assert!(matches!(err, PurchaseError::ConcertNotFound(id) if id.as_i64() == 3));

        let err = PurchaseError::from(DomainError::InsufficientInventory {
            concert_id: ConcertId::new(1),
            requested: 51,
            available: 50,
        });
        assert_eq!(err.kind(), "insufficient_inventory");

        let err = PurchaseError::from(DomainError::OrderNotFound("id 4".to_string()));
        assert!(matches!(err, PurchaseError::Storage(_)));
    }

    #[test]
    fn test_payment_errors_map_to_outcomes() {
        assert!(matches!(
            PurchaseError::from(PaymentError::InvalidToken),
            PurchaseError::InvalidToken
        ));
        assert!(matches!(
            PurchaseError::from(PaymentError::Unavailable("timeout".to_string())),
            PurchaseError::PaymentFailed(reason) if reason == "timeout"
        ));
    }
}
