//! Ticket stock per concert.

use common::{ConcertId, OrderId};
use store::{Concert, NewOrder, Order, Store, Ticket};

use crate::error::DomainError;

/// Service owning ticket creation, reservation and release.
///
/// Reservations are all-or-nothing. Two concurrent reservations can never be
/// handed the same ticket; the store serializes the check-and-claim.
#[derive(Clone)]
pub struct TicketInventory<S: Store> {
    store: S,
}

impl<S: Store> TicketInventory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates `quantity` fresh tickets for a concert.
    #[tracing::instrument(skip(self, concert), fields(concert_id = %concert.id))]
    pub async fn add(&self, concert: &Concert, quantity: u32) -> Result<Vec<Ticket>, DomainError> {
        let tickets = self.store.insert_tickets(concert.id, quantity).await?;
        tracing::info!(count = tickets.len(), "tickets added");
        Ok(tickets)
    }

    /// Lists available tickets of a concert in id order.
    ///
    /// A `limit` of zero or less means no cap.
    #[tracing::instrument(skip(self))]
    pub async fn find_available(
        &self,
        concert_id: ConcertId,
        limit: i64,
    ) -> Result<Vec<Ticket>, DomainError> {
        let limit = if limit <= 0 {
            None
        } else {
            Some(u32::try_from(limit).unwrap_or(u32::MAX))
        };
        Ok(self.store.available_tickets(concert_id, limit).await?)
    }

    /// Assigns `quantity` available tickets to an existing order.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidOrder(
                "ticket quantity must be at least 1".to_string(),
            ));
        }

        let tickets = self
            .store
            .reserve_tickets(concert_id, order_id, quantity)
            .await?;
        metrics::counter!("tickets_reserved_total").increment(tickets.len() as u64);
        tracing::info!(count = tickets.len(), "tickets reserved");
        Ok(tickets)
    }

    /// Creates an order and reserves its tickets as one unit.
    ///
    /// When the concert is short on tickets no order is written.
    #[tracing::instrument(skip(self, order), fields(concert_id = %order.concert_id, quantity = order.ticket_quantity))]
    pub async fn reserve_for_order(&self, order: NewOrder) -> Result<Order, DomainError> {
        if order.ticket_quantity == 0 {
            return Err(DomainError::InvalidOrder(
                "ticket quantity must be at least 1".to_string(),
            ));
        }
        if order.email.trim().is_empty() {
            return Err(DomainError::InvalidOrder("email is required".to_string()));
        }

        let order = self.store.reserve_for_new_order(order).await?;
        metrics::counter!("tickets_reserved_total").increment(order.tickets.len() as u64);
        tracing::info!(order_id = %order.id, count = order.tickets.len(), "tickets reserved");
        Ok(order)
    }

    /// Returns every ticket held by an order to the pool.
    ///
    /// Releasing an order that holds nothing is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, order_id: OrderId) -> Result<u64, DomainError> {
        let released = self.store.release_tickets(order_id).await?;
        if released > 0 {
            metrics::counter!("tickets_released_total").increment(released);
            tracing::info!(released, "tickets released");
        }
        Ok(released)
    }

    /// Counts unassigned tickets of a concert.
    #[tracing::instrument(skip(self))]
    pub async fn remaining(&self, concert_id: ConcertId) -> Result<u64, DomainError> {
        Ok(self.store.count_available_tickets(concert_id).await?)
    }

    /// Lists every ticket across all concerts.
    pub async fn find_all(&self) -> Result<Vec<Ticket>, DomainError> {
        Ok(self.store.list_tickets().await?)
    }

    /// Lists the tickets currently held by an order.
    pub async fn tickets_for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>, DomainError> {
        Ok(self.store.tickets_for_order(order_id).await?)
    }
}
