//! Purchase orchestrator: reserve, charge, compensate.

use common::{ConcertId, OrderId};
use domain::{ConcertCatalog, OrderLedger, order_amount};
use store::{NewOrder, Order, Store};

use crate::error::PurchaseError;
use crate::payment::{PaymentError, PaymentGateway};
use crate::state::{PurchaseAttempt, PurchaseState};

/// Drives a ticket purchase to a finalized order or a clean rejection.
///
/// Tickets and the order row are written together. The charge runs after
/// that write commits; if it fails, the order is cancelled so the tickets
/// return to the pool.
pub struct PurchaseOrchestrator<S, P>
where
    S: Store + Clone,
    P: PaymentGateway,
{
    catalog: ConcertCatalog<S>,
    ledger: OrderLedger<S>,
    payment: P,
}

impl<S, P> PurchaseOrchestrator<S, P>
where
    S: Store + Clone,
    P: PaymentGateway,
{
    /// Creates a new orchestrator.
    pub fn new(store: S, payment: P) -> Self {
        Self {
            catalog: ConcertCatalog::new(store.clone()),
            ledger: OrderLedger::new(store),
            payment,
        }
    }

    /// Purchases `quantity` tickets of a published concert.
    ///
    /// Returns the finalized order with its tickets. On any failure no order
    /// remains and every reserved ticket is available again, unless the
    /// rollback itself fails, which is reported as `CompensationFailed`.
    #[tracing::instrument(skip(self, email, token))]
    pub async fn purchase(
        &self,
        concert_id: ConcertId,
        email: &str,
        quantity: u32,
        token: &str,
    ) -> Result<Order, PurchaseError> {
        metrics::counter!("purchases_total").increment(1);
        let start = std::time::Instant::now();

        let mut attempt = PurchaseAttempt::new(concert_id, quantity);
        let result = self.run(&mut attempt, email, token).await;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("purchase_duration_seconds").record(duration);

        match &result {
            Ok(order) => {
                tracing::info!(order_id = %order.id, amount = %order.amount, duration, "purchase completed");
            }
            Err(err) => {
                metrics::counter!("purchases_failed", "reason" => err.kind()).increment(1);
                attempt.reject(err.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        attempt: &mut PurchaseAttempt,
        email: &str,
        token: &str,
    ) -> Result<Order, PurchaseError> {
        if attempt.ticket_quantity == 0 {
            return Err(PurchaseError::InvalidQuantity);
        }

        let concert = self
            .catalog
            .find_published_by_id(attempt.concert_id)
            .await?;
        attempt.advance(PurchaseState::ConcertResolved)?;

        let amount = order_amount(&concert, attempt.ticket_quantity)?;
        let order = self
            .ledger
            .inventory()
            .reserve_for_order(NewOrder::new(
                email,
                concert.id,
                attempt.ticket_quantity,
                amount,
            ))
            .await?;
        attempt.reserved(order.id)?;

        match self.payment.charge(order.amount, token).await {
            Ok(receipt) => {
                attempt.advance(PurchaseState::PaymentCharged)?;
                tracing::info!(order_id = %order.id, charge_id = %receipt.charge_id, "payment charged");
                attempt.advance(PurchaseState::OrderFinalized)?;
                Ok(order)
            }
            Err(err) => {
                self.compensate(order.id, &err).await?;
                Err(err.into())
            }
        }
    }

    /// Cancels the order of a failed charge.
    #[tracing::instrument(skip(self, cause))]
    async fn compensate(&self, order_id: OrderId, cause: &PaymentError) -> Result<(), PurchaseError> {
        tracing::warn!(%cause, "payment failed, cancelling order");

        match self.ledger.cancel(order_id).await {
            Ok(released) => {
                tracing::info!(released, "order compensated");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "compensation failed, order left in place");
                Err(PurchaseError::CompensationFailed {
                    order_id,
                    reason: err.to_string(),
                })
            }
        }
    }
}
