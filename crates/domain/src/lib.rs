//! Domain services for the ticketing system.
//!
//! This crate provides the three services the purchase flow is built from:
//! - [`ConcertCatalog`] for concert lookup and publish-state gating
//! - [`TicketInventory`] for ticket allocation, reservation and release
//! - [`OrderLedger`] for order records and cancellation
//!
//! Each service is constructed with an explicit [`store::Store`] handle.

pub mod catalog;
pub mod error;
pub mod inventory;
pub mod ledger;

pub use catalog::ConcertCatalog;
pub use error::DomainError;
pub use inventory::TicketInventory;
pub use ledger::{OrderLedger, order_amount};
