use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Concert, ConcertId, NewConcert, NewOrder, Order, OrderId, Result, StoreError, Ticket,
    TicketId,
    store::{Store, Visibility},
};

#[derive(Debug, Default)]
struct MemoryState {
    concerts: BTreeMap<ConcertId, Concert>,
    tickets: BTreeMap<TicketId, Ticket>,
    /// Orders are kept without tickets; they are attached on read.
    orders: BTreeMap<OrderId, Order>,
    last_concert_id: i64,
    last_ticket_id: i64,
    last_order_id: i64,
    fail_on_delete_order: bool,
}

impl MemoryState {
    fn tickets_of(&self, order_id: OrderId) -> Vec<Ticket> {
        self.tickets
            .values()
            .filter(|t| t.order_id == Some(order_id))
            .cloned()
            .collect()
    }

    fn with_tickets(&self, order: &Order) -> Order {
        Order {
            tickets: self.tickets_of(order.id),
            ..order.clone()
        }
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        if !self.concerts.contains_key(&order.concert_id) {
            return Err(StoreError::ConcertNotFound(order.concert_id));
        }

        self.last_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.last_order_id),
            email: order.email,
            concert_id: order.concert_id,
            ticket_quantity: order.ticket_quantity,
            amount: order.amount,
            created_at: now,
            updated_at: now,
            tickets: Vec::new(),
        };
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    /// Check-and-claim. Must run under the write guard.
    fn claim(
        &mut self,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>> {
        let candidates: Vec<TicketId> = self
            .tickets
            .values()
            .filter(|t| t.concert_id == concert_id && t.is_available())
            .map(|t| t.id)
            .take(quantity as usize)
            .collect();

        if candidates.len() < quantity as usize {
            return Err(StoreError::InsufficientTickets {
                concert_id,
                requested: quantity,
                available: candidates.len() as u32,
            });
        }

        let now = Utc::now();
        let mut claimed = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(ticket) = self.tickets.get_mut(&id) {
                ticket.order_id = Some(order_id);
                ticket.updated_at = now;
                claimed.push(ticket.clone());
            }
        }
        Ok(claimed)
    }
}

/// In-memory store implementation for testing and local development.
///
/// All state sits behind one lock, so every trait method is atomic with
/// respect to every other. Ids are assigned sequentially from 1, like the
/// `BIGSERIAL` columns of the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `delete_order` fail with a pool timeout until reset.
    pub async fn set_fail_on_delete_order(&self, fail: bool) {
        self.state.write().await.fail_on_delete_order = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_concert(&self, concert: NewConcert) -> Result<Concert> {
        let mut state = self.state.write().await;
        state.last_concert_id += 1;

        let now = Utc::now();
        let concert = Concert {
            id: ConcertId::new(state.last_concert_id),
            title: concert.title,
            subtitle: concert.subtitle,
            date: concert.date,
            ticket_price: concert.ticket_price,
            venue: concert.venue,
            venue_address: concert.venue_address,
            city: concert.city,
            state: concert.state,
            zip: concert.zip,
            additional_information: concert.additional_information,
            published_at: concert.published_at,
            created_at: now,
            updated_at: now,
        };
        state.concerts.insert(concert.id, concert.clone());
        Ok(concert)
    }

    async fn get_concert(&self, id: ConcertId, visibility: Visibility) -> Result<Option<Concert>> {
        let state = self.state.read().await;
        Ok(state
            .concerts
            .get(&id)
            .filter(|c| visibility.admits(c))
            .cloned())
    }

    async fn list_concerts(&self, visibility: Visibility) -> Result<Vec<Concert>> {
        let state = self.state.read().await;
        Ok(state
            .concerts
            .values()
            .filter(|c| visibility.admits(c))
            .cloned()
            .collect())
    }

    async fn insert_tickets(&self, concert_id: ConcertId, quantity: u32) -> Result<Vec<Ticket>> {
        let mut state = self.state.write().await;
        if !state.concerts.contains_key(&concert_id) {
            return Err(StoreError::ConcertNotFound(concert_id));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(quantity as usize);
        for _ in 0..quantity {
            state.last_ticket_id += 1;
            let ticket = Ticket {
                id: TicketId::new(state.last_ticket_id),
                concert_id,
                order_id: None,
                created_at: now,
                updated_at: now,
            };
            state.tickets.insert(ticket.id, ticket.clone());
            created.push(ticket);
        }
        Ok(created)
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self.state.read().await.tickets.values().cloned().collect())
    }

    async fn available_tickets(
        &self,
        concert_id: ConcertId,
        limit: Option<u32>,
    ) -> Result<Vec<Ticket>> {
        let state = self.state.read().await;
        let available = state
            .tickets
            .values()
            .filter(|t| t.concert_id == concert_id && t.is_available())
            .cloned();

        Ok(match limit {
            Some(limit) => available.take(limit as usize).collect(),
            None => available.collect(),
        })
    }

    async fn count_available_tickets(&self, concert_id: ConcertId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.concert_id == concert_id && t.is_available())
            .count() as u64)
    }

    async fn tickets_for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>> {
        Ok(self.state.read().await.tickets_of(order_id))
    }

    async fn reserve_tickets(
        &self,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>> {
        let mut state = self.state.write().await;

        let order_concert_id = state
            .orders
            .get(&order_id)
            .map(|o| o.concert_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if order_concert_id != concert_id {
            return Err(StoreError::ConcertMismatch {
                order_id,
                order_concert_id,
                concert_id,
            });
        }

        state.claim(concert_id, order_id, quantity)
    }

    async fn reserve_for_new_order(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        if !state.concerts.contains_key(&order.concert_id) {
            return Err(StoreError::ConcertNotFound(order.concert_id));
        }

        let available = state
            .tickets
            .values()
            .filter(|t| t.concert_id == order.concert_id && t.is_available())
            .count();
        if available < order.ticket_quantity as usize {
            return Err(StoreError::InsufficientTickets {
                concert_id: order.concert_id,
                requested: order.ticket_quantity,
                available: available as u32,
            });
        }

        let concert_id = order.concert_id;
        let quantity = order.ticket_quantity;
        let mut created = state.insert_order(order)?;
        created.tickets = state.claim(concert_id, created.id, quantity)?;
        Ok(created)
    }

    async fn release_tickets(&self, order_id: OrderId) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let mut released = 0;
        for ticket in state
            .tickets
            .values_mut()
            .filter(|t| t.order_id == Some(order_id))
        {
            ticket.order_id = None;
            ticket.updated_at = now;
            released += 1;
        }
        Ok(released)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        self.state.write().await.insert_order(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).map(|o| state.with_tickets(o)))
    }

    async fn find_order_by_email(&self, email: &str) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.email == email)
            .map(|o| state.with_tickets(o)))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .map(|o| state.with_tickets(o))
            .collect())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_on_delete_order {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(state.orders.remove(&id).is_some())
    }
}
