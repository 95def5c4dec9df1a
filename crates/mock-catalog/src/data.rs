use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::cmp::Ordering;

/// Categories served by default, with how many products each holds.
pub const CATEGORIES: &[(&str, &str, usize)] = &[
    ("beauty", "Beauty", 5),
    ("fragrances", "Fragrances", 5),
    ("furniture", "Furniture", 5),
    ("groceries", "Groceries", 27),
    ("home-decoration", "Home Decoration", 5),
    ("kitchen-accessories", "Kitchen Accessories", 30),
    ("laptops", "Laptops", 5),
    ("mens-shirts", "Mens Shirts", 5),
    ("smartphones", "Smartphones", 16),
    ("sports-accessories", "Sports Accessories", 17),
];

const SEED: u64 = 0x5eed_ca7a_1065;

/// Generated product set, stable across runs.
pub struct MockData {
    products: Vec<Value>,
    categories: Vec<(String, String)>,
}

impl MockData {
    pub fn generate() -> Self {
        Self::with_categories(CATEGORIES)
    }

    pub fn with_categories(layout: &[(&str, &str, usize)]) -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut products = Vec::new();
        let mut categories = Vec::with_capacity(layout.len());
        let mut id = 1u64;

        for &(slug, name, count) in layout {
            categories.push((slug.to_string(), name.to_string()));
            for n in 1..=count {
                products.push(product(&mut rng, id, slug, name, n));
                id += 1;
            }
        }

        Self {
            products,
            categories,
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn by_id(&self, id: u64) -> Option<&Value> {
        self.products
            .iter()
            .find(|p| p.get("id").and_then(Value::as_u64) == Some(id))
    }

    /// Products in `category` (all when `None`), sorted by `sort_by` if set.
    pub fn listing(&self, category: Option<&str>, sort_by: Option<&str>, descending: bool) -> Vec<&Value> {
        let mut matching: Vec<&Value> = self
            .products
            .iter()
            .filter(|p| match category {
                Some(slug) => p.get("category").and_then(Value::as_str) == Some(slug),
                None => true,
            })
            .collect();

        if let Some(field) = sort_by {
            if descending {
                matching.sort_by(|a, b| compare_field(b, a, field));
            } else {
                matching.sort_by(|a, b| compare_field(a, b, field));
            }
        }
        matching
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().map(|(slug, name)| (slug.as_str(), name.as_str()))
    }
}

fn product(rng: &mut StdRng, id: u64, slug: &str, name: &str, n: usize) -> Value {
    let cents: u64 = rng.gen_range(199..=249_999);
    let rating: u32 = rng.gen_range(100..=500);
    let discount: u32 = rng.gen_range(0..=2000);
    let stock: u32 = rng.gen_range(0..=120);

    json!({
        "id": id,
        "title": format!("{name} Item {n}"),
        "description": format!("Sample product {n} from the {name} range."),
        "category": slug,
        "price": cents as f64 / 100.0,
        "discountPercentage": discount as f64 / 100.0,
        "rating": rating as f64 / 100.0,
        "stock": stock,
        "brand": format!("{name} Co"),
        "sku": format!("{}-{id:04}", slug.to_uppercase()),
        "thumbnail": format!("https://cdn.example.test/products/{id}/thumbnail.png"),
        "images": [format!("https://cdn.example.test/products/{id}/1.png")],
    })
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
