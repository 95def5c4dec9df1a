use crate::types::{CategoryFilter, PageRequest};
use url::form_urlencoded;

pub const CATEGORIES_PATH: &str = "/products/categories";

/// Path and query for one page of a listing.
///
/// `All` goes to the flat `/products` listing, a slug to the category-scoped
/// `/products/category/{slug}` listing. `limit` and `skip` are always sent;
/// `sortBy`/`order` only when a sort field was requested.
pub fn page_path(request: &PageRequest) -> String {
    let path = match &request.filter.category {
        CategoryFilter::All => "/products".to_string(),
        CategoryFilter::Slug(slug) => format!("/products/category/{slug}"),
    };

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("limit", &request.page_size.to_string());
    query.append_pair("skip", &request.offset.to_string());
    if let Some(field) = &request.filter.sort_by {
        query.append_pair("sortBy", field);
        query.append_pair("order", request.filter.order.as_str());
    }

    format!("{path}?{}", query.finish())
}

pub fn item_path(id: u64) -> String {
    format!("/products/{id}")
}

/// Cache key for a GET of `path_and_query`.
pub fn cache_key(path_and_query: &str) -> String {
    format!("GET:{path_and_query}")
}
