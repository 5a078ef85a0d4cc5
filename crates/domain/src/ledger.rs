//! Orders and their lifecycle.

use common::{Money, OrderId};
use store::{Concert, NewOrder, Order, Store};

use crate::error::DomainError;
use crate::inventory::TicketInventory;

/// Computes the charge for `quantity` tickets of a concert.
pub fn order_amount(concert: &Concert, quantity: u32) -> Result<Money, DomainError> {
    concert
        .ticket_price
        .checked_multiply(quantity)
        .ok_or_else(|| {
            DomainError::InvalidOrder(format!(
                "amount overflows for {quantity} tickets at {}",
                concert.ticket_price
            ))
        })
}

/// Service for creating, finding and cancelling orders.
///
/// Cancelling always releases the order's tickets before the order row is
/// removed, so a cancelled order never leaves tickets stranded.
#[derive(Clone)]
pub struct OrderLedger<S: Store + Clone> {
    store: S,
    inventory: TicketInventory<S>,
}

impl<S: Store + Clone> OrderLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            inventory: TicketInventory::new(store.clone()),
            store,
        }
    }

    /// Returns the inventory this ledger releases tickets through.
    pub fn inventory(&self) -> &TicketInventory<S> {
        &self.inventory
    }

    /// Records an order without reserving tickets.
    #[tracing::instrument(skip(self, order), fields(concert_id = %order.concert_id))]
    pub async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = self.store.insert_order(order).await?;
        tracing::info!(order_id = %order.id, "order created");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(id))
    }

    /// Finds the oldest order placed with an email address.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Order, DomainError> {
        self.store
            .find_order_by_email(email)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(format!("email {email}")))
    }

    pub async fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders().await?)
    }

    /// Releases an order's tickets, then deletes the order.
    ///
    /// Returns the number of tickets released.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<u64, DomainError> {
        let released = self.inventory.release(id).await?;
        self.delete(id).await?;
        tracing::info!(released, "order cancelled");
        Ok(released)
    }

    /// Deletes an order row. Its tickets are left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<(), DomainError> {
        if self.store.delete_order(id).await? {
            Ok(())
        } else {
            Err(DomainError::order_not_found(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, NewConcert};

    async fn setup() -> (OrderLedger<InMemoryStore>, InMemoryStore, Concert) {
        let store = InMemoryStore::new();
        let concert = store
            .insert_concert(
                NewConcert::builder()
                    .ticket_price(Money::from_cents(3250))
                    .published()
                    .build(),
            )
            .await
            .unwrap();
        store.insert_tickets(concert.id, 10).await.unwrap();
        (OrderLedger::new(store.clone()), store, concert)
    }

    #[tokio::test]
    async fn test_order_amount() {
        let (_, _, concert) = setup().await;
        assert_eq!(order_amount(&concert, 3).unwrap(), Money::from_cents(9750));
        assert_eq!(order_amount(&concert, 0).unwrap(), Money::zero());

        let pricey = Concert {
            ticket_price: Money::from_cents(i64::MAX),
            ..concert
        };
        assert!(matches!(
            order_amount(&pricey, 2),
            Err(DomainError::InvalidOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (ledger, _, concert) = setup().await;
        let created = ledger
            .create(NewOrder::new(
                "john@example.com",
                concert.id,
                2,
                Money::from_cents(6500),
            ))
            .await
            .unwrap();

        let by_id = ledger.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.email, "john@example.com");
        assert!(by_id.tickets.is_empty());

        let by_email = ledger.find_by_email("john@example.com").await.unwrap();
        assert_eq!(by_email.id, created.id);

        let missing = ledger.find_by_email("nobody@example.com").await;
        assert!(matches!(missing, Err(DomainError::OrderNotFound(_))));
        assert_eq!(ledger.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_returns_tickets() {
        let (ledger, _, concert) = setup().await;
        let order = ledger
            .inventory()
            .reserve_for_order(NewOrder::new(
                "john@example.com",
                concert.id,
                3,
                Money::from_cents(9750),
            ))
            .await
            .unwrap();
        assert_eq!(ledger.inventory().remaining(concert.id).await.unwrap(), 7);

        assert_eq!(ledger.cancel(order.id).await.unwrap(), 3);
        assert_eq!(ledger.inventory().remaining(concert.id).await.unwrap(), 10);
        assert!(matches!(
            ledger.find_by_id(order.id).await,
            Err(DomainError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_missing_order() {
        let (ledger, _, _) = setup().await;
        let result = ledger.cancel(OrderId::new(42)).await;
        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_leaves_tickets() {
        let (ledger, _, concert) = setup().await;
        let order = ledger
            .inventory()
            .reserve_for_order(NewOrder::new(
                "john@example.com",
                concert.id,
                2,
                Money::from_cents(6500),
            ))
            .await
            .unwrap();

        ledger.delete(order.id).await.unwrap();
        assert_eq!(ledger.inventory().remaining(concert.id).await.unwrap(), 8);
        assert_eq!(
            ledger.inventory().tickets_for_order(order.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_cancel_surfaces_storage_failure() {
        let (ledger, store, concert) = setup().await;
        let order = ledger
            .inventory()
            .reserve_for_order(NewOrder::new(
                "john@example.com",
                concert.id,
                1,
                Money::from_cents(3250),
            ))
            .await
            .unwrap();
        store.set_fail_on_delete_order(true).await;

        let result = ledger.cancel(order.id).await;
        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(ledger.inventory().remaining(concert.id).await.unwrap(), 10);
    }
}
