use crate::error::CatalogError;
use crate::query::{item_path, page_path, CATEGORIES_PATH};
use crate::source::CatalogSource;
use crate::types::{Category, PageRequest, PageResult, Product};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// Client for the remote product service.
///
/// One request per call: no retries and no timeout beyond whatever the
/// underlying transport applies.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path produced by [`crate::query`].
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, CatalogError> {
        let start = Instant::now();
        let url = self.url_for(path_and_query);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "catalog request failed");
            CatalogError::transport(&url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "catalog returned error status");
            return Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "failed to decode catalog response");
            CatalogError::transport(&url, e)
        })?;

        tracing::debug!(
            url = %url,
            latency_ms = start.elapsed().as_millis() as u64,
            "catalog request ok"
        );
        Ok(body)
    }
}

impl CatalogSource for HttpCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, CatalogError> {
        self.get_json(&page_path(request)).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.get_json(CATEGORIES_PATH).await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Product, CatalogError> {
        match self.get_json(&item_path(id)).await {
            Err(CatalogError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(CatalogError::NotFound { id })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryFilter, ListingFilter, SortOrder};
    use axum::extract::{Path, RawQuery};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve a tiny fake catalog on an ephemeral port and return its base URL.
    async fn spawn_upstream() -> String {
        async fn listing(RawQuery(query): RawQuery) -> Json<Value> {
            Json(json!({
                "products": [{"id": 1, "title": "flat", "extra_query": query}],
                "total": 1, "skip": 0, "limit": 5
            }))
        }
        async fn category(Path(slug): Path<String>, RawQuery(query): RawQuery) -> Json<Value> {
            Json(json!({
                "products": [{"id": 2, "title": slug, "extra_query": query}],
                "total": 1, "skip": 0, "limit": 5
            }))
        }
        async fn item(Path(id): Path<u64>) -> Result<Json<Value>, AxumStatus> {
            match id {
                1 => Ok(Json(json!({"id": 1, "title": "Mascara", "stock": 4}))),
                500 => Err(AxumStatus::INTERNAL_SERVER_ERROR),
                _ => Err(AxumStatus::NOT_FOUND),
            }
        }
        async fn categories() -> Json<Value> {
            Json(json!([
                {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
                {"slug": "furniture", "name": "Furniture", "url": "https://dummyjson.com/products/category/furniture"}
            ]))
        }

        let app = Router::new()
            .route("/products", get(listing))
            .route("/products/categories", get(categories))
            .route("/products/category/{slug}", get(category))
            .route("/products/{id}", get(item));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_flat_listing_with_sort_params() {
        let catalog = HttpCatalog::new(spawn_upstream().await);
        let request = PageRequest::first(
            ListingFilter::new(CategoryFilter::All, Some("price".into()), SortOrder::Desc),
            5,
        );

        let page = catalog.fetch_page(&request).await.unwrap();
        assert_eq!(page.items[0].title, "flat");
        assert_eq!(
            page.items[0].extra["extra_query"],
            "limit=5&skip=0&sortBy=price&order=desc"
        );
    }

    #[tokio::test]
    async fn fetches_category_scoped_listing() {
        let catalog = HttpCatalog::new(spawn_upstream().await);
        let request = PageRequest::first(
            ListingFilter::new(CategoryFilter::Slug("beauty".into()), None, SortOrder::Asc),
            5,
        );

        let page = catalog.fetch_page(&request).await.unwrap();
        assert_eq!(page.items[0].title, "beauty");
        assert_eq!(page.items[0].extra["extra_query"], "limit=5&skip=0");
    }

    #[tokio::test]
    async fn categories_keep_name_and_slug() {
        let catalog = HttpCatalog::new(spawn_upstream().await);
        let categories = catalog.fetch_categories().await.unwrap();
        assert_eq!(
            categories,
            vec![
                Category { name: "Beauty".into(), slug: "beauty".into() },
                Category { name: "Furniture".into(), slug: "furniture".into() },
            ]
        );
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let catalog = HttpCatalog::new(spawn_upstream().await);
        assert_eq!(catalog.fetch_by_id(1).await.unwrap().stock, 4);

        let err = catalog.fetch_by_id(99).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn server_error_carries_url_and_status() {
        let base = spawn_upstream().await;
        let catalog = HttpCatalog::new(base.clone());

        let err = catalog.fetch_by_id(500).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.url(), Some(format!("{base}/products/500").as_str()));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let catalog = HttpCatalog::new(format!("http://{addr}/"));
        let err = catalog.fetch_categories().await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport { .. }));
        assert_eq!(
            err.url(),
            Some(format!("http://{addr}/products/categories").as_str())
        );
    }
}
