pub mod cached;
pub mod error;
pub mod http;
pub mod pagination;
pub mod query;
pub mod single_flight;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cached::{CacheTtls, CachedCatalog, CatalogCache};
pub use error::{CatalogError, FilterError};
pub use http::HttpCatalog;
pub use pagination::{ControllerOptions, LoadMoreController, LoadState, MergeOutcome, PendingFetch};
pub use source::CatalogSource;
pub use types::{
    Availability, Category, CategoryFilter, ListingFilter, PageRequest, PageResult, Product,
    SortOrder,
};
