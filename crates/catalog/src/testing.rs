use crate::error::CatalogError;
use crate::query::{item_path, page_path};
use crate::source::CatalogSource;
use crate::types::{Category, CategoryFilter, PageRequest, PageResult, Product, SortOrder};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;

const FAKE_BASE_URL: &str = "http://fake.catalog";

#[derive(Default)]
struct Calls {
    pages: Vec<PageRequest>,
    categories: usize,
    items: usize,
}

pub struct FakeCatalog {
    products: Vec<Product>,
    categories: Vec<Category>,
    delay: Option<Duration>,
    calls: Mutex<Calls>,
    failing_offsets: Mutex<HashSet<u64>>,
}

impl FakeCatalog {
    /// Products spread over the given categories. Ids start at 1 and run
    /// across categories in order; prices equal `id` so price sorting is
    /// easy to predict.
    pub fn with_categories(layout: &[(&str, usize)]) -> Self {
        let mut products = Vec::new();
        let mut categories = Vec::new();
        let mut next_id = 1u64;

        for (slug, count) in layout {
            categories.push(Category {
                name: title_case(slug),
                slug: slug.to_string(),
            });
            for _ in 0..*count {
                products.push(product(next_id, slug));
                next_id += 1;
            }
        }

        Self {
            products,
            categories,
            delay: None,
            calls: Mutex::new(Calls::default()),
            failing_offsets: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_category(slug: &str, count: usize) -> Self {
        Self::with_categories(&[(slug, count)])
    }

    /// Delay every call by `millis`, to let concurrent callers overlap.
    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// Page requests at `offset` answer with a 500 until cleared.
    pub fn fail_offset(&self, offset: u64) {
        self.failing_offsets.lock().insert(offset);
    }

    pub fn clear_failures(&self) {
        self.failing_offsets.lock().clear();
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn page_calls(&self) -> usize {
        self.calls.lock().pages.len()
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.calls.lock().pages.clone()
    }

    pub fn category_calls(&self) -> usize {
        self.calls.lock().categories
    }

    pub fn item_calls(&self) -> usize {
        self.calls.lock().items
    }

    fn listing(&self, request: &PageRequest) -> Vec<&Product> {
        let mut matching: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match &request.filter.category {
                CategoryFilter::All => true,
                CategoryFilter::Slug(slug) => &p.category == slug,
            })
            .collect();

        if request.filter.sort_by.as_deref() == Some("price") {
            matching.sort_by(|a, b| a.price.total_cmp(&b.price));
            if request.filter.order == SortOrder::Desc {
                matching.reverse();
            }
        }
        matching
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl CatalogSource for FakeCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, CatalogError> {
        self.calls.lock().pages.push(request.clone());
        self.pause().await;

        if self.failing_offsets.lock().contains(&request.offset) {
            return Err(CatalogError::Status {
                url: format!("{FAKE_BASE_URL}{}", page_path(request)),
                status: 500,
            });
        }

        let matching = self.listing(request);
        let items = matching
            .iter()
            .skip(request.offset as usize)
            .take(request.page_size as usize)
            .map(|p| (*p).clone())
            .collect();

        Ok(PageResult {
            items,
            total: matching.len() as u64,
            offset: request.offset,
            page_size: request.page_size,
        })
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.calls.lock().categories += 1;
        self.pause().await;
        Ok(self.categories.clone())
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Product, CatalogError> {
        self.calls.lock().items += 1;
        self.pause().await;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| {
                tracing::debug!(path = %item_path(id), "fake catalog has no such product");
                CatalogError::NotFound { id }
            })
    }
}

fn product(id: u64, category: &str) -> Product {
    Product {
        id,
        title: format!("{} #{id}", title_case(category)),
        description: String::new(),
        price: id as f64,
        discount_percentage: None,
        rating: None,
        stock: 20,
        brand: None,
        category: category.to_string(),
        thumbnail: None,
        images: Vec::new(),
        extra: serde_json::Map::new(),
    }
}

fn title_case(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
