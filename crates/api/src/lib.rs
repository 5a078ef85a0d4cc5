//! HTTP API server for concert listing and ticket purchases.
//!
//! Provides REST endpoints under `/api/v1`, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::ConcertCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use purchase::{FakePaymentGateway, PurchaseOrchestrator};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::concerts::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/concerts", get(routes::concerts::list::<S>))
        .route("/concerts/{id}", get(routes::concerts::get::<S>))
        .route(
            "/concerts/{id}/orders",
            post(routes::concerts::create_order::<S>),
        );

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", api)
        .with_state(state)
        .merge(metrics_router)
        .fallback(routes::system::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store, with a fake payment gateway
/// accepting `valid_token`.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    valid_token: &str,
) -> (Arc<AppState<S>>, FakePaymentGateway) {
    let payment = FakePaymentGateway::with_valid_token(valid_token);

    let state = Arc::new(AppState {
        catalog: ConcertCatalog::new(store.clone()),
        purchases: PurchaseOrchestrator::new(store, payment.clone()),
    });

    (state, payment)
}
