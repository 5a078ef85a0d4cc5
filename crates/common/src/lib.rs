//! Shared types for the ticketing workspace.

pub mod ids;
pub mod money;

pub use ids::{ConcertId, OrderId, TicketId};
pub use money::Money;
