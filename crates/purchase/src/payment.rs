//! Payment gateway trait and fake implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::Money;
use thiserror::Error;

/// The only token [`FakePaymentGateway::new`] accepts.
pub const DEFAULT_VALID_TOKEN: &str = "valid payment token";

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// The charge id assigned by the gateway.
    pub charge_id: String,
    pub amount: Money,
}

/// Reasons a charge can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("invalid payment token")]
    InvalidToken,

    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Trait for charging a payment token.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` against `token`.
    async fn charge(&self, amount: Money, token: &str) -> Result<PaymentReceipt, PaymentError>;
}

#[derive(Debug, Default)]
struct FakeGatewayState {
    charges: Vec<PaymentReceipt>,
    next_id: u32,
    unavailable: bool,
}

/// Gateway that accepts exactly one token and keeps every receipt.
#[derive(Debug, Clone)]
pub struct FakePaymentGateway {
    valid_token: Arc<str>,
    state: Arc<RwLock<FakeGatewayState>>,
}

impl Default for FakePaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePaymentGateway {
    /// Creates a gateway accepting [`DEFAULT_VALID_TOKEN`].
    pub fn new() -> Self {
        Self::with_valid_token(DEFAULT_VALID_TOKEN)
    }

    /// Creates a gateway accepting `token`.
    pub fn with_valid_token(token: impl Into<String>) -> Self {
        Self {
            valid_token: Arc::from(token.into()),
            state: Arc::default(),
        }
    }

    /// Makes every charge fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Returns the number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.read().charges.len()
    }

    /// Returns every successful charge in order.
    pub fn charges(&self) -> Vec<PaymentReceipt> {
        self.read().charges.clone()
    }

    /// Returns the total of all successful charges.
    pub fn total_charged(&self) -> Money {
        self.read()
            .charges
            .iter()
            .fold(Money::zero(), |total, receipt| total + receipt.amount)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, FakeGatewayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FakeGatewayState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn charge(&self, amount: Money, token: &str) -> Result<PaymentReceipt, PaymentError> {
        let mut state = self.write();

        if state.unavailable {
            return Err(PaymentError::Unavailable("gateway offline".to_string()));
        }
        if token != &*self.valid_token {
            return Err(PaymentError::InvalidToken);
        }

        state.next_id += 1;
        let receipt = PaymentReceipt {
            charge_id: format!("CH-{:04}", state.next_id),
            amount,
        };
        state.charges.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_token_is_charged() {
        let gateway = FakePaymentGateway::new();

        let receipt = gateway
            .charge(Money::from_cents(9750), DEFAULT_VALID_TOKEN)
            .await
            .unwrap();
        assert_eq!(receipt.charge_id, "CH-0001");
        assert_eq!(receipt.amount, Money::from_cents(9750));
        assert_eq!(gateway.charge_count(), 1);
        assert_eq!(gateway.total_charged(), Money::from_cents(9750));
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let gateway = FakePaymentGateway::new();

        let result = gateway
            .charge(Money::from_cents(100), "invalid payment token")
            .await;
        assert_eq!(result, Err(PaymentError::InvalidToken));
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_token() {
        let gateway = FakePaymentGateway::with_valid_token("tok_test");

        assert!(gateway.charge(Money::from_cents(1), "tok_test").await.is_ok());
        assert_eq!(
            gateway.charge(Money::from_cents(1), DEFAULT_VALID_TOKEN).await,
            Err(PaymentError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_unavailable_gateway() {
        let gateway = FakePaymentGateway::new();
        gateway.set_unavailable(true);

        let result = gateway
            .charge(Money::from_cents(100), DEFAULT_VALID_TOKEN)
            .await;
        assert!(matches!(result, Err(PaymentError::Unavailable(_))));

        gateway.set_unavailable(false);
        let receipt = gateway
            .charge(Money::from_cents(100), DEFAULT_VALID_TOKEN)
            .await
            .unwrap();
        assert_eq!(receipt.charge_id, "CH-0001");
    }

    #[tokio::test]
    async fn test_clones_share_receipts() {
        let gateway = FakePaymentGateway::new();
        let clone = gateway.clone();

        clone
            .charge(Money::from_cents(500), DEFAULT_VALID_TOKEN)
            .await
            .unwrap();
        assert_eq!(gateway.charges().len(), 1);
    }
}
