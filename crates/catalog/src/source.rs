use crate::error::CatalogError;
use crate::types::{Category, PageRequest, PageResult, Product};
use std::future::Future;

/// Anything that can answer catalog queries.
///
/// Implemented by the HTTP client, by the caching wrapper around it, and by
/// the in-memory fake used in tests. Futures are `Send` so fetches can be
/// spawned as background tasks.
pub trait CatalogSource: Send + Sync + 'static {
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResult, CatalogError>> + Send;

    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<Category>, CatalogError>> + Send;

    fn fetch_by_id(&self, id: u64) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}

