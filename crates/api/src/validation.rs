//! Request body validation for ticket orders.

use serde::{Deserialize, Serialize};

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every failing field of a request, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

/// Raw body of `POST /api/v1/concerts/{id}/orders`.
///
/// Fields are optional so that a missing field is reported as a
/// validation error instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub email: Option<String>,
    pub ticket_quantity: Option<i64>,
    pub payment_token: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub email: String,
    pub ticket_quantity: u32,
    pub payment_token: String,
}

impl CreateOrderRequest {
    /// Checks every field and reports all failures at once.
    pub fn validate(self) -> Result<OrderRequest, ValidationErrors> {
        let mut errors = Vec::new();

        let email = self.email.unwrap_or_default().trim().to_string();
        if email.is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        } else if !is_valid_email(&email) {
            errors.push(FieldError::new(
                "email",
                "email must be a valid email address",
            ));
        }

        let quantity = match self.ticket_quantity.unwrap_or(0) {
            0 => {
                errors.push(FieldError::new(
                    "ticket_quantity",
                    "ticket_quantity is required",
                ));
                0
            }
            n if n < 0 => {
                errors.push(FieldError::new(
                    "ticket_quantity",
                    "ticket_quantity must be 1 or greater",
                ));
                0
            }
            n => u32::try_from(n).unwrap_or_else(|_| {
                errors.push(FieldError::new(
                    "ticket_quantity",
                    format!("ticket_quantity must be {} or less", u32::MAX),
                ));
                0
            }),
        };

        let payment_token = self.payment_token.unwrap_or_default();
        if payment_token.trim().is_empty() {
            errors.push(FieldError::new(
                "payment_token",
                "payment_token is required",
            ));
        }

        if errors.is_empty() {
            Ok(OrderRequest {
                email,
                ticket_quantity: quantity,
                payment_token,
            })
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

/// Minimal address check: one `@`, a non-empty local part and a dotted
/// domain, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
