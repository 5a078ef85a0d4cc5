//! Ticket purchase flow.
//!
//! This crate drives a purchase from request to a finalized order:
//! 1. Resolve the published concert
//! 2. Reserve tickets and record the order in one storage transaction
//! 3. Charge the payment gateway
//!
//! If the charge fails, the order is cancelled and its tickets go back to
//! the pool before the failure is reported.

pub mod error;
pub mod orchestrator;
pub mod payment;
pub mod state;

pub use error::PurchaseError;
pub use orchestrator::PurchaseOrchestrator;
pub use payment::{
    DEFAULT_VALID_TOKEN, FakePaymentGateway, PaymentError, PaymentGateway, PaymentReceipt,
};
pub use state::{PurchaseAttempt, PurchaseState};
