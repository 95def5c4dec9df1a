use catalog::{Category, LoadState, Product};
use std::fmt;

const TITLE_WIDTH: usize = 40;

/// One row of a listing.
pub fn product_line(p: &Product) -> String {
    format!(
        "{:>6}  {:<width$}  {:>10}  {}",
        format!("#{}", p.id),
        truncate(&p.title, TITLE_WIDTH),
        format!("${:.2}", p.price),
        p.availability(),
        width = TITLE_WIDTH,
    )
}

/// Footer under a listing: how much is shown and whether more can be loaded.
pub fn progress(shown: usize, total: Option<u64>, state: LoadState) -> String {
    let counts = match total {
        Some(total) => format!("showing {shown} of {total}"),
        None => format!("showing {shown}"),
    };
    match state {
        LoadState::Exhausted => format!("{counts}, end of listing"),
        LoadState::Loading => format!("{counts}, loading..."),
        LoadState::Idle => format!("{counts}, more available"),
    }
}

pub fn product_detail(p: &Product) -> String {
    Detail(p).to_string()
}

struct Detail<'a>(&'a Product);

impl fmt::Display for Detail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "{} (#{})", p.title, p.id)?;
        writeln!(f, "  category:     {}", p.category)?;
        if let Some(brand) = &p.brand {
            writeln!(f, "  brand:        {brand}")?;
        }
        match (p.list_price(), p.discount_percentage) {
            (Some(list), Some(pct)) => {
                writeln!(f, "  price:        ${:.2} (was ${list:.2}, -{pct:.0}%)", p.price)?
            }
            _ => writeln!(f, "  price:        ${:.2}", p.price)?,
        }
        if let Some(rating) = p.rating {
            writeln!(f, "  rating:       {rating:.1} / 5")?;
        }
        writeln!(f, "  availability: {}", p.availability())?;
        if !p.description.is_empty() {
            writeln!(f)?;
            writeln!(f, "  {}", p.description)?;
        }
        Ok(())
    }
}

pub fn category_line(c: &Category) -> String {
    format!("{:<24}  {}", c.slug, c.name)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::testing::FakeCatalog;

    fn sample() -> Product {
        FakeCatalog::with_category("beauty", 1).products()[0].clone()
    }

    #[test]
    fn product_line_shows_id_price_and_stock() {
        let mut p = sample();
        p.stock = 3;
        let line = product_line(&p);
        assert!(line.contains("#1"));
        assert!(line.contains("$1.00"));
        assert!(line.ends_with("Low Stock (3 left)"));
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut p = sample();
        p.title = "x".repeat(80);
        let line = product_line(&p);
        assert!(line.contains(&format!("{}...", "x".repeat(TITLE_WIDTH - 3))));
        assert!(!line.contains(&"x".repeat(TITLE_WIDTH)));
    }

    #[test]
    fn progress_reflects_state() {
        assert_eq!(
            progress(5, Some(12), LoadState::Idle),
            "showing 5 of 12, more available"
        );
        assert_eq!(
            progress(12, Some(12), LoadState::Exhausted),
            "showing 12 of 12, end of listing"
        );
        assert_eq!(progress(0, None, LoadState::Loading), "showing 0, loading...");
    }

    #[test]
    fn detail_includes_discount_when_present() {
        let mut p = sample();
        p.price = 80.0;
        p.discount_percentage = Some(20.0);
        p.stock = 0;
        let detail = product_detail(&p);
        assert!(detail.contains("$80.00 (was $96.00, -20%)"));
        assert!(detail.contains("Out of Stock"));
    }

    #[test]
    fn detail_skips_missing_fields() {
        let detail = product_detail(&sample());
        let lines: Vec<&str> = detail.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Beauty #1 (#1)");
        assert_eq!(lines[2], "  price:        $1.00");
        assert!(lines[3].starts_with("  availability: "));
        assert!(detail.ends_with('\n'));
    }
}
