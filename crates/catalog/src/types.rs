use crate::error::FilterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A product record.
///
/// Pagination logic never looks past `id`. Fields the service sends that are
/// not modelled here are kept in `extra` so the record can be passed through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Stock level shown on the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    OutOfStock,
    /// Fewer than [`LOW_STOCK_THRESHOLD`] units left.
    LowStock(u32),
    InStock,
}

pub const LOW_STOCK_THRESHOLD: u32 = 10;

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::OutOfStock => f.write_str("Out of Stock"),
            Availability::LowStock(n) => write!(f, "Low Stock ({n} left)"),
            Availability::InStock => f.write_str("In Stock"),
        }
    }
}

impl Product {
    pub fn availability(&self) -> Availability {
        match self.stock {
            0 => Availability::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => Availability::LowStock(n),
            _ => Availability::InStock,
        }
    }

    /// Price before the advertised discount, if there is one.
    pub fn list_price(&self) -> Option<f64> {
        self.discount_percentage
            .filter(|pct| *pct > 0.0)
            .map(|pct| self.price * (1.0 + pct / 100.0))
    }
}

/// An entry of the category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
}

/// Which slice of the catalog a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Slug(String),
}

impl CategoryFilter {
    pub fn slug(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Slug(s) => Some(s),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = FilterError;

    /// `"all"` selects everything; anything else must be a plain slug so it
    /// can sit in a URL path segment as-is.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(CategoryFilter::Slug(s.to_string()))
        } else {
            Err(FilterError::InvalidCategory(s.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Slug(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(FilterError::InvalidOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category plus sort: the identity of one browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListingFilter {
    pub category: CategoryFilter,
    /// Field to sort by. `order` is only sent upstream when this is set.
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl ListingFilter {
    pub fn new(category: CategoryFilter, sort_by: Option<String>, order: SortOrder) -> Self {
        Self {
            category,
            sort_by,
            order,
        }
    }
}

impl fmt::Display for ListingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort_by {
            Some(field) => write!(f, "{} by {} {}", self.category, field, self.order),
            None => write!(f, "{}", self.category),
        }
    }
}

/// One window of a listing. Fully determines a remote query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub filter: ListingFilter,
    pub offset: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn first(filter: ListingFilter, page_size: u64) -> Self {
        Self {
            filter,
            offset: 0,
            page_size,
        }
    }

    /// The window directly after this one.
    pub fn next(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            offset: self.offset + self.page_size,
            page_size: self.page_size,
        }
    }
}

/// One page as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(rename = "products")]
    pub items: Vec<Product>,
    pub total: u64,
    #[serde(rename = "skip", default)]
    pub offset: u64,
    #[serde(rename = "limit", default)]
    pub page_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_filter_parses_all_and_slugs() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "mens-shirts".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Slug("mens-shirts".into())
        );
        assert!("".parse::<CategoryFilter>().is_err());
        assert!("../admin".parse::<CategoryFilter>().is_err());
        assert!("a b".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn sort_order_round_trips_through_str() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }

    #[test]
    fn next_page_request_advances_by_page_size() {
        let first = PageRequest::first(ListingFilter::default(), 5);
        let second = first.next();
        assert_eq!(second.offset, 5);
        assert_eq!(second.next().offset, 10);
        assert_eq!(second.filter, first.filter);
    }

    #[test]
    fn page_result_uses_service_field_names() {
        let page: PageResult = serde_json::from_value(json!({
            "products": [{"id": 1, "title": "Mascara", "price": 9.99, "category": "beauty",
                          "sku": "BEA-1", "tags": ["beauty"]}],
            "total": 12,
            "skip": 0,
            "limit": 5
        }))
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 12);
        assert_eq!(page.page_size, 5);

        // Unmodelled fields survive a round trip.
        let out = serde_json::to_value(&page).unwrap();
        assert_eq!(out["products"][0]["sku"], "BEA-1");
        assert_eq!(out["skip"], 0);
    }

    #[test]
    fn availability_thresholds() {
        let mut product: Product = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(product.availability(), Availability::OutOfStock);
        product.stock = 3;
        assert_eq!(product.availability(), Availability::LowStock(3));
        assert_eq!(product.availability().to_string(), "Low Stock (3 left)");
        product.stock = 10;
        assert_eq!(product.availability(), Availability::InStock);
    }

    #[test]
    fn list_price_undoes_discount() {
        let mut product: Product =
            serde_json::from_value(json!({"id": 1, "price": 100.0, "discountPercentage": 10.0}))
                .unwrap();
        let list = product.list_price().unwrap();
        assert!((list - 110.0).abs() < 1e-9);

        product.discount_percentage = None;
        assert!(product.list_price().is_none());
    }
}
