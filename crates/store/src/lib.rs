//! Storage layer for the ticketing system.
//!
//! The [`Store`] trait is the single persistence seam: catalog, inventory
//! and ledger services receive an implementation at construction time.
//! [`PostgresStore`] backs production, [`InMemoryStore`] backs tests and
//! local development.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{ConcertId, Money, OrderId, TicketId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{Concert, ConcertBuilder, NewConcert, NewOrder, Order, Ticket};
pub use postgres::PostgresStore;
pub use store::{Store, Visibility};
