//! Domain error types.

use common::{ConcertId, OrderId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The concert does not exist or is not visible to the caller.
    #[error("Concert not found: {0}")]
    ConcertNotFound(ConcertId),

    /// No order matches the lookup key.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A reservation asked for more tickets than are available.
    #[error(
        "Not enough tickets for concert {concert_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        concert_id: ConcertId,
        requested: u32,
        available: u32,
    },

    /// The order description is malformed.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// An unexpected storage failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub(crate) fn order_not_found(id: OrderId) -> Self {
        DomainError::OrderNotFound(format!("id {id}"))
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientTickets {
                concert_id,
                requested,
                available,
            } => DomainError::InsufficientInventory {
                concert_id,
                requested,
                available,
            },
            StoreError::ConcertNotFound(id) => DomainError::ConcertNotFound(id),
            StoreError::OrderNotFound(id) => DomainError::order_not_found(id),
            err @ StoreError::ConcertMismatch { .. } => DomainError::InvalidOrder(err.to_string()),
            other => DomainError::Store(other),
        }
    }
}
