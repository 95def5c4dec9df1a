use crate::error::CatalogError;
use crate::query::{cache_key, item_path, page_path, CATEGORIES_PATH};
use crate::single_flight::SingleFlight;
use crate::source::CatalogSource;
use crate::types::{Category, PageRequest, PageResult, Product};
use catalog_cache::{CacheStats, Clock, ResponseCache, SystemClock};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Time-to-live per kind of lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub page: Duration,
    pub categories: Duration,
    pub item: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            page: Duration::from_secs(300),
            categories: Duration::from_secs(3600),
            item: Duration::from_secs(300),
        }
    }
}

/// The process-local catalog cache: one typed store per kind of lookup, all
/// keyed by the resolved request path and all reading the same clock.
pub struct CatalogCache {
    pages: Arc<ResponseCache<PageResult>>,
    categories: Arc<ResponseCache<Vec<Category>>>,
    items: Arc<ResponseCache<Product>>,
}

impl CatalogCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self::with_clock(ttls, Arc::new(SystemClock))
    }

    pub fn with_clock(ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            pages: Arc::new(ResponseCache::with_clock(ttls.page, Arc::clone(&clock))),
            categories: Arc::new(ResponseCache::with_clock(ttls.categories, Arc::clone(&clock))),
            items: Arc::new(ResponseCache::with_clock(ttls.item, clock)),
        }
    }

    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            page: self.pages.default_ttl(),
            categories: self.categories.default_ttl(),
            item: self.items.default_ttl(),
        }
    }

    /// Combined statistics of all stores.
    pub fn stats(&self) -> CacheStats {
        let mut total = self.pages.stats();
        total.accumulate(&self.categories.stats());
        total.accumulate(&self.items.stats());
        total
    }

    pub fn page_stats(&self) -> CacheStats {
        self.pages.stats()
    }

    pub fn category_stats(&self) -> CacheStats {
        self.categories.stats()
    }

    pub fn item_stats(&self) -> CacheStats {
        self.items.stats()
    }
}

type Flight<T> = SingleFlight<Arc<T>, CatalogError>;

struct Flights {
    pages: Flight<PageResult>,
    categories: Flight<Vec<Category>>,
    items: Flight<Product>,
}

/// Wraps a [`CatalogSource`] with the [`CatalogCache`].
///
/// Hits are served without touching the inner source. Misses go upstream and
/// successful results are stored under the request's key; errors are never
/// cached.
///
/// Two identical requests racing on a cold key both reach the inner source
/// unless single-flight de-duplication is switched on.
pub struct CachedCatalog<S> {
    inner: Arc<S>,
    cache: Arc<CatalogCache>,
    flights: Option<Flights>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(inner: S, cache: Arc<CatalogCache>) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
            flights: None,
        }
    }

    /// Share one upstream call between concurrent requests for the same key.
    pub fn with_single_flight(mut self) -> Self {
        self.flights = Some(Flights {
            pages: SingleFlight::new(),
            categories: SingleFlight::new(),
            items: SingleFlight::new(),
        });
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    async fn lookup<T, F, Fut>(
        &self,
        key: String,
        store: &Arc<ResponseCache<T>>,
        flight: Option<&Flight<T>>,
        fetch: F,
    ) -> Result<Arc<T>, CatalogError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Arc<S>) -> Fut,
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
    {
        if let Some(hit) = store.get(&key) {
            tracing::debug!(key = %key, "cache HIT");
            return Ok(hit);
        }
        tracing::debug!(key = %key, "cache MISS");

        let upstream = fetch(Arc::clone(&self.inner));
        let store = Arc::clone(store);
        let store_key = key.clone();
        let call = async move {
            let value = Arc::new(upstream.await?);
            store.put_shared(store_key, Arc::clone(&value));
            Ok(value)
        };

        match flight {
            Some(flight) => flight.run(&key, move || call).await,
            None => call.await,
        }
    }
}

impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, CatalogError> {
        let request = request.clone();
        let key = cache_key(&page_path(&request));
        let flight = self.flights.as_ref().map(|f| &f.pages);
        let page = self
            .lookup(key, &self.cache.pages, flight, move |inner| async move {
                inner.fetch_page(&request).await
            })
            .await?;
        Ok(Arc::unwrap_or_clone(page))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let key = cache_key(CATEGORIES_PATH);
        let flight = self.flights.as_ref().map(|f| &f.categories);
        let categories = self
            .lookup(key, &self.cache.categories, flight, |inner| async move {
                inner.fetch_categories().await
            })
            .await?;
        Ok(Arc::unwrap_or_clone(categories))
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Product, CatalogError> {
        let key = cache_key(&item_path(id));
        let flight = self.flights.as_ref().map(|f| &f.items);
        let product = self
            .lookup(key, &self.cache.items, flight, move |inner| async move {
                inner.fetch_by_id(id).await
            })
            .await?;
        Ok(Arc::unwrap_or_clone(product))
    }
}
