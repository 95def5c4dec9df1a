use axum::extract::State;
use axum::Json;
use catalog::CatalogCache;
use catalog_cache::CacheStats;
use serde::Serialize;
use std::sync::Arc;

pub const REQUESTS_TOTAL: &str = "storefront_requests_total";
pub const UPSTREAM_ERRORS_TOTAL: &str = "storefront_upstream_errors_total";

pub fn record_request(route: &'static str) {
    ::metrics::counter!(REQUESTS_TOTAL, "route" => route).increment(1);
}

pub fn record_upstream_error(route: &'static str) {
    ::metrics::counter!(UPSTREAM_ERRORS_TOTAL, "route" => route).increment(1);
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreMetrics {
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub inserts: u64,
    pub size: usize,
}

impl From<CacheStats> for StoreMetrics {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            inserts: stats.inserts,
            size: stats.current_size,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub pages: StoreMetrics,
    pub categories: StoreMetrics,
    pub items: StoreMetrics,
    pub total: StoreMetrics,
    pub ttl_seconds: TtlReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtlReport {
    pub page: u64,
    pub categories: u64,
    pub item: u64,
}

impl CacheReport {
    pub fn from_cache(cache: &CatalogCache) -> Self {
        let ttls = cache.ttls();
        Self {
            pages: cache.page_stats().into(),
            categories: cache.category_stats().into(),
            items: cache.item_stats().into(),
            total: cache.stats().into(),
            ttl_seconds: TtlReport {
                page: ttls.page.as_secs(),
                categories: ttls.categories.as_secs(),
                item: ttls.item.as_secs(),
            },
        }
    }
}

/// GET /api/stats: one-shot cache statistics.
pub async fn stats_handler(State(cache): State<Arc<CatalogCache>>) -> Json<CacheReport> {
    Json(CacheReport::from_cache(&cache))
}
