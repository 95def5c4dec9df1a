use crate::config::ListingDefaults;
use crate::error::ApiError;
use crate::stats;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use catalog::{
    CatalogError, CatalogSource, Category, CategoryFilter, ListingFilter, PageRequest, PageResult,
    Product, SortOrder,
};
use serde::Deserialize;
use std::sync::Arc;

/// Largest `limit` a client may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Shared state passed to all handlers.
pub struct AppState<S> {
    pub catalog: S,
    pub defaults: ListingDefaults,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub category: Option<String>,
    pub order: Option<String>,
}

impl<S> AppState<S> {
    /// Resolve a listing query against the configured defaults.
    pub fn page_request(&self, query: ProductQuery) -> Result<PageRequest, ApiError> {
        let defaults = &self.defaults;

        let category = match non_empty(query.category) {
            Some(raw) => raw.parse::<CategoryFilter>()?,
            None => defaults.category.clone(),
        };
        let order = match non_empty(query.order) {
            Some(raw) => raw.parse::<SortOrder>()?,
            None => defaults.order,
        };

        let limit = query.limit.unwrap_or(defaults.page_size);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        Ok(PageRequest {
            filter: ListingFilter::new(category, defaults.sort_by.clone(), order),
            offset: query.skip.unwrap_or(0),
            page_size: limit,
        })
    }
}

pub fn router<S: CatalogSource>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/products", get(list_products::<S>))
        .route("/api/products/{id}", get(product::<S>))
        .route("/api/categories", get(categories::<S>))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /api/products: one window of the listing.
async fn list_products<S: CatalogSource>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<PageResult>, ApiError> {
    stats::record_request("products");

    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = state.page_request(query)?;

    match state.catalog.fetch_page(&request).await {
        Ok(page) => Ok(Json(page)),
        Err(e) => {
            upstream_failed("products", &e);
            Err(ApiError::Upstream("Failed to fetch products"))
        }
    }
}

/// GET /api/products/{id}
async fn product<S: CatalogSource>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    stats::record_request("product");

    let Path(id) = id.map_err(|_| ApiError::BadRequest("invalid product id".to_string()))?;

    match state.catalog.fetch_by_id(id).await {
        Ok(product) => Ok(Json(product)),
        Err(e) if e.is_not_found() => Err(ApiError::NotFound(format!("Product {id} not found"))),
        Err(e) => {
            upstream_failed("product", &e);
            Err(ApiError::Upstream("Failed to fetch product"))
        }
    }
}

/// GET /api/categories
async fn categories<S: CatalogSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    stats::record_request("categories");

    match state.catalog.fetch_categories().await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => {
            upstream_failed("categories", &e);
            Err(ApiError::Upstream("Failed to fetch categories"))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

fn upstream_failed(route: &'static str, e: &CatalogError) {
    stats::record_upstream_error(route);
    tracing::error!(
        route,
        error = %e,
        url = e.url().unwrap_or_default(),
        status = e.status(),
        "upstream request failed"
    );
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use catalog::testing::FakeCatalog;
    use catalog::{CacheTtls, CachedCatalog, CatalogCache};
    use serde_json::Value;
    use tower::ServiceExt;

    fn state<S>(catalog: S) -> Arc<AppState<S>> {
        Arc::new(AppState {
            catalog,
            defaults: ListingDefaults::default(),
        })
    }

    fn fake() -> FakeCatalog {
        FakeCatalog::with_categories(&[("beauty", 12), ("laptops", 4)])
    }

    async fn get_json<S: CatalogSource>(state: &Arc<AppState<S>>, uri: &str) -> (StatusCode, Value) {
        let response = router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ids(body: &Value) -> Vec<u64> {
        body["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn listing_applies_configured_defaults() {
        let state = state(fake());
        let (status, body) = get_json(&state, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 3, 4, 5]);
        assert_eq!(body["total"], 16);
        assert_eq!(body["skip"], 0);
        assert_eq!(body["limit"], 5);

        let request = &state.catalog.page_requests()[0];
        assert_eq!(request.filter.category, CategoryFilter::All);
        assert_eq!(request.filter.sort_by.as_deref(), Some("price"));
        assert_eq!(request.filter.order, SortOrder::Asc);
    }

    #[tokio::test]
    async fn listing_honours_query_parameters() {
        let state = state(fake());
        let (status, body) =
            get_json(&state, "/api/products?category=beauty&order=desc&limit=4&skip=4").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![8, 7, 6, 5]);
        assert_eq!(body["total"], 12);
        assert_eq!(body["skip"], 4);
    }

    #[tokio::test]
    async fn empty_parameters_fall_back_to_defaults() {
        let state = state(fake());
        let (status, body) = get_json(&state, "/api/products?category=&order=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 16);
    }

    #[tokio::test]
    async fn unsorted_default_sends_no_sort_field() {
        let state = Arc::new(AppState {
            catalog: fake(),
            defaults: ListingDefaults {
                sort_by: None,
                ..ListingDefaults::default()
            },
        });
        let (status, _) = get_json(&state, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.catalog.page_requests()[0].filter.sort_by, None);
    }

    #[tokio::test]
    async fn malformed_parameters_are_rejected() {
        let state = state(fake());

        for uri in [
            "/api/products?order=sideways",
            "/api/products?category=../admin",
            "/api/products?limit=abc",
            "/api/products?limit=0",
            "/api/products?limit=1000",
        ] {
            let (status, body) = get_json(&state, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
        assert_eq!(state.catalog.page_calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_500() {
        let state = state(fake());
        state.catalog.fail_offset(0);

        let (status, body) = get_json(&state, "/api/products").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Failed to fetch products" }));
    }

    #[tokio::test]
    async fn single_product_lookup() {
        let state = state(fake());

        let (status, body) = get_json(&state, "/api/products/14").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "laptops");

        let (status, body) = get_json(&state, "/api/products/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Product 99 not found");

        let (status, _) = get_json(&state, "/api/products/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn categories_are_listed() {
        let state = state(fake());
        let (status, body) = get_json(&state, "/api/categories").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "beauty");
        assert_eq!(body[1]["name"], "Laptops");
    }

    #[tokio::test]
    async fn repeated_listing_is_served_from_cache() {
        let cache = Arc::new(CatalogCache::new(CacheTtls::default()));
        let state = state(CachedCatalog::new(fake(), cache));

        let (_, first) = get_json(&state, "/api/products?category=beauty").await;
        let (_, second) = get_json(&state, "/api/products?category=beauty").await;

        assert_eq!(first, second);
        assert_eq!(state.catalog.inner().page_calls(), 1);
        assert_eq!(state.catalog.cache().page_stats().hits, 1);
    }

    #[tokio::test]
    async fn health_is_plain_text() {
        let response = router(state(fake()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
