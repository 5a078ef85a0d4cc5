use async_trait::async_trait;

use crate::{
    Concert, ConcertId, NewConcert, NewOrder, Order, OrderId, Result, Ticket,
};

/// Which concerts a catalog query may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only concerts with a publish timestamp.
    Published,
    /// Every concert, published or not.
    All,
}

impl Visibility {
    /// Returns true if a concert passes this filter.
    pub fn admits(&self, concert: &Concert) -> bool {
        match self {
            Visibility::Published => concert.is_published(),
            Visibility::All => true,
        }
    }
}

/// Core trait for ticketing storage implementations.
///
/// All implementations must be thread-safe (Send + Sync). Every method is a
/// single unit of work; the reservation methods are the only ones that must
/// serialize against concurrent callers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a concert and returns it with its assigned id.
    async fn insert_concert(&self, concert: NewConcert) -> Result<Concert>;

    /// Retrieves one concert if it exists and passes `visibility`.
    async fn get_concert(&self, id: ConcertId, visibility: Visibility) -> Result<Option<Concert>>;

    /// Lists concerts passing `visibility`, in id order.
    async fn list_concerts(&self, visibility: Visibility) -> Result<Vec<Concert>>;

    /// Creates `quantity` unassigned tickets for a concert.
    ///
    /// Fails with `ConcertNotFound` if the concert does not exist.
    async fn insert_tickets(&self, concert_id: ConcertId, quantity: u32) -> Result<Vec<Ticket>>;

    /// Lists every ticket, in id order.
    async fn list_tickets(&self) -> Result<Vec<Ticket>>;

    /// Lists unassigned tickets of a concert in id order, capped at `limit`
    /// when one is given.
    async fn available_tickets(
        &self,
        concert_id: ConcertId,
        limit: Option<u32>,
    ) -> Result<Vec<Ticket>>;

    /// Counts unassigned tickets of a concert.
    async fn count_available_tickets(&self, concert_id: ConcertId) -> Result<u64>;

    /// Lists the tickets currently assigned to an order, in id order.
    async fn tickets_for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>>;

    /// Assigns `quantity` available tickets of a concert to an existing order.
    ///
    /// Runs as one atomic unit: if fewer than `quantity` tickets are
    /// available the call fails with `InsufficientTickets` and writes
    /// nothing. The order must exist and belong to the same concert.
    async fn reserve_tickets(
        &self,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>>;

    /// Inserts an order and assigns `order.ticket_quantity` available tickets
    /// to it in the same atomic unit.
    ///
    /// On `InsufficientTickets` neither the order nor any ticket change is
    /// persisted.
    async fn reserve_for_new_order(&self, order: NewOrder) -> Result<Order>;

    /// Clears the order reference of every ticket assigned to an order.
    ///
    /// Returns the number of tickets released; zero is not an error.
    async fn release_tickets(&self, order_id: OrderId) -> Result<u64>;

    /// Inserts an order row without touching any ticket.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order with its tickets.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves the oldest order placed with an email address.
    async fn find_order_by_email(&self, email: &str) -> Result<Option<Order>>;

    /// Lists every order with its tickets, in id order.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Deletes an order row without touching its tickets.
    ///
    /// Returns false if no such order existed.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;
}
