use catalog::{CacheTtls, CategoryFilter, FilterError, SortOrder};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_page_ttl")]
    pub page_ttl_seconds: u64,
    #[serde(default = "default_category_ttl")]
    pub category_ttl_seconds: u64,
    #[serde(default = "default_item_ttl")]
    pub item_ttl_seconds: u64,
    /// Share one upstream call between concurrent misses on the same key.
    #[serde(default)]
    pub dedupe_in_flight: bool,
}

/// Listing parameters applied when a request leaves them out.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

/// Parsed form of [`ListingConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDefaults {
    pub page_size: u64,
    pub category: CategoryFilter,
    pub order: SortOrder,
    /// `None` leaves the order to the upstream service.
    pub sort_by: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.listing.defaults()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Config::default()
    }

    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            page: Duration::from_secs(self.cache.page_ttl_seconds),
            categories: Duration::from_secs(self.cache.category_ttl_seconds),
            item: Duration::from_secs(self.cache.item_ttl_seconds),
        }
    }
}

impl ListingConfig {
    pub fn defaults(&self) -> Result<ListingDefaults, FilterError> {
        Ok(ListingDefaults {
            page_size: self.page_size.max(1),
            category: self.category.parse()?,
            order: self.order.parse()?,
            sort_by: Some(self.sort_by.trim().to_string()).filter(|s| !s.is_empty()),
        })
    }
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            category: CategoryFilter::All,
            order: SortOrder::Asc,
            sort_by: Some(default_sort_by()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_ttl_seconds: default_page_ttl(),
            category_ttl_seconds: default_category_ttl(),
            item_ttl_seconds: default_item_ttl(),
            dedupe_in_flight: false,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            category: default_category(),
            order: default_order(),
            sort_by: default_sort_by(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
fn default_upstream_url() -> String {
    catalog::http::DEFAULT_BASE_URL.to_string()
}
fn default_page_ttl() -> u64 {
    300
}
fn default_category_ttl() -> u64 {
    3600
}
fn default_item_ttl() -> u64 {
    300
}
fn default_page_size() -> u64 {
    5
}
fn default_category() -> String {
    "all".to_string()
}
fn default_order() -> String {
    "asc".to_string()
}
fn default_sort_by() -> String {
    "price".to_string()
}
