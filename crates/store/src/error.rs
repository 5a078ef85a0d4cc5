use thiserror::Error;

use crate::{ConcertId, OrderId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Fewer unassigned tickets exist than were requested. Nothing was written.
    #[error(
        "Not enough tickets for concert {concert_id}: requested {requested}, available {available}"
    )]
    InsufficientTickets {
        concert_id: ConcertId,
        requested: u32,
        available: u32,
    },

    /// The referenced concert does not exist.
    #[error("Concert not found: {0}")]
    ConcertNotFound(ConcertId),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Tickets of one concert cannot be assigned to an order of another.
    #[error("Order {order_id} belongs to concert {order_concert_id}, not {concert_id}")]
    ConcertMismatch {
        order_id: OrderId,
        order_concert_id: ConcertId,
        concert_id: ConcertId,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
