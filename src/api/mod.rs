//! HTTP surface: listing page, JSON listing endpoints and detail lookups.

pub mod handlers;
pub mod render;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::ListingSource;

/// Shared state for handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub listings: Arc<dyn ListingSource>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::listing_page).post(handlers::listing_form))
        .route("/accommodations", get(handlers::listings_json))
        .route("/api/listings", get(handlers::listings_json))
        .route("/details/{id}", get(handlers::details))
        .route("/accommodation_details/{id}", get(handlers::details))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
