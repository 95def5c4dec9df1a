mod data;

pub use data::{MockData, CATEGORIES};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

/// Page size the service uses when `limit` is absent.
pub const DEFAULT_LIMIT: usize = 30;

struct MockState {
    data: MockData,
    latency_ms: Option<RangeInclusive<u64>>,
}

impl MockState {
    async fn simulate_latency(&self) {
        if let Some(range) = &self.latency_ms {
            let delay = rand::thread_rng().gen_range(range.clone());
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    limit: Option<usize>,
    skip: Option<usize>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    order: Option<String>,
}

/// Router serving `data`. With `latency_ms` set, every request sleeps for a
/// random number of milliseconds drawn from the range.
pub fn router(data: MockData, latency_ms: Option<RangeInclusive<u64>>) -> Router {
    let state = Arc::new(MockState { data, latency_ms });

    Router::new()
        .route("/products", get(list_all))
        .route("/products/categories", get(categories))
        .route("/products/category/{slug}", get(list_category))
        .route("/products/{id}", get(product))
        .route("/health", get(health))
        .with_state(state)
}

async fn list_all(State(state): State<Arc<MockState>>, Query(params): Query<ListParams>) -> Response {
    listing(&state, None, params).await
}

async fn list_category(
    State(state): State<Arc<MockState>>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    listing(&state, Some(&slug), params).await
}

async fn listing(state: &MockState, category: Option<&str>, params: ListParams) -> Response {
    state.simulate_latency().await;

    let descending = match params.order.as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            tracing::debug!(order = other, "rejecting unknown order");
            return message(StatusCode::BAD_REQUEST, "Order can be: 'asc' or 'desc'");
        }
    };

    let matching = state
        .data
        .listing(category, params.sort_by.as_deref(), descending);
    let total = matching.len();
    let skip = params.skip.unwrap_or(0);
    let limit = match params.limit.unwrap_or(DEFAULT_LIMIT) {
        0 => total,
        n => n,
    };

    let products: Vec<&Value> = matching.into_iter().skip(skip).take(limit).collect();
    tracing::debug!(category, skip, limit, returned = products.len(), total, "listing served");

    Json(json!({
        "products": products,
        "total": total,
        "skip": skip,
        "limit": products.len(),
    }))
    .into_response()
}

async fn product(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.simulate_latency().await;

    let found = id.parse::<u64>().ok().and_then(|id| state.data.by_id(id));
    match found {
        Some(product) => Json(product.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, &format!("Product with id '{id}' not found")),
    }
}

async fn categories(State(state): State<Arc<MockState>>) -> Json<Vec<Value>> {
    state.simulate_latency().await;

    let categories = state
        .data
        .categories()
        .map(|(slug, name)| {
            json!({
                "slug": slug,
                "name": name,
                "url": format!("/products/category/{slug}"),
            })
        })
        .collect();
    Json(categories)
}

async fn health() -> &'static str {
    "ok"
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}
