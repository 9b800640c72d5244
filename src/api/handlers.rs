use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::error::{ListingError, Result};
use crate::models::AccommodationRecord;
use crate::query::{normalize, RawParams};

use super::render::listing_page as render_listing_page;
use super::AppState;

/// The page reflects the submitted filters, so it must never be served from a cache
const NO_STORE: &str = "no-cache, no-store, must-revalidate";

type Page = ([(header::HeaderName, &'static str); 1], Html<String>);

fn query_params(query: Option<String>) -> RawParams {
    RawParams::from_urlencoded(query.as_deref().unwrap_or_default().as_bytes())
}

async fn render(state: &AppState, params: &RawParams) -> Result<Page> {
    let filter = normalize(params)?;
    let records = state.listings.search(&filter).await?;
    let page = render_listing_page(&state.config.vocabulary, &filter, &records);
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Html(page)))
}

/// `GET /` with filters in the query string
pub async fn listing_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Page> {
    render(&state, &query_params(query)).await
}

/// `POST /` with filters in a urlencoded form body
pub async fn listing_form(State(state): State<AppState>, body: Bytes) -> Result<Page> {
    render(&state, &RawParams::from_urlencoded(&body)).await
}

/// `GET /accommodations` and `GET /api/listings`
pub async fn listings_json(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<AccommodationRecord>>> {
    let filter = normalize(&query_params(query))?;
    let records = state.listings.search(&filter).await?;
    Ok(Json(records))
}

/// `GET /details/{id}` and `GET /accommodation_details/{id}`
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccommodationRecord>> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ListingError::validation("id", &id, "expected an integer"))?;
    let record = state.listings.find(id).await?;
    Ok(Json(record))
}

pub async fn health(State(state): State<AppState>) -> Response {
    let source = state.listings.source_name();
    match state.listings.ping().await {
        Ok(()) => Json(json!({ "status": "ok", "source": source })).into_response(),
        Err(e) => {
            warn!(error = %e, source, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "source": source })),
            )
                .into_response()
        }
    }
}
