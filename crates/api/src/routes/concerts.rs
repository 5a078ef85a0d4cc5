//! Concert listing and ticket purchase endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ConcertId;
use domain::ConcertCatalog;
use purchase::{FakePaymentGateway, PurchaseOrchestrator};
use store::{Concert, Order, Store};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::validation::CreateOrderRequest;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store + Clone> {
    pub catalog: ConcertCatalog<S>,
    pub purchases: PurchaseOrchestrator<S, FakePaymentGateway>,
}

/// Parses a path id; only positive integers are accepted.
fn parse_concert_id(raw: &str) -> Result<ConcertId, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(ConcertId::new)
        .ok_or_else(|| ApiError::BadRequest(format!("id \"{raw}\" is invalid")))
}

/// GET /api/v1/concerts: every published concert.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<Vec<Concert>>>, ApiError> {
    let concerts = state.catalog.find_published().await?;
    Ok(Json(ApiResponse::list(concerts)))
}

/// GET /api/v1/concerts/{id}: one published concert.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Concert>>, ApiError> {
    let concert_id = parse_concert_id(&id)?;
    let concert = state.catalog.find_published_by_id(concert_id).await?;
    Ok(Json(ApiResponse::data(concert)))
}

/// POST /api/v1/concerts/{id}/orders: purchase tickets.
#[tracing::instrument(skip(state, body))]
pub async fn create_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>), ApiError> {
    let concert_id = parse_concert_id(&id)?;
    let Json(body) = body?;
    let request = body.validate()?;

    let order = state
        .purchases
        .purchase(
            concert_id,
            &request.email,
            request.ticket_quantity,
            &request.payment_token,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(order))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concert_id() {
        assert_eq!(parse_concert_id("42").unwrap(), ConcertId::new(42));
        for raw in ["0", "-1", "abc", "1.5", ""] {
            assert!(matches!(
                parse_concert_id(raw),
                Err(ApiError::BadRequest(msg)) if msg == format!("id \"{raw}\" is invalid")
            ));
        }
    }
}
