mod render;
mod shop;

use catalog::http::DEFAULT_BASE_URL;
use catalog::{
    CacheTtls, CachedCatalog, CatalogCache, CatalogError, CatalogSource, CategoryFilter,
    ControllerOptions, HttpCatalog, ListingFilter, LoadMoreController, SortOrder,
};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Storefront catalog browser: paginated listings with load-more.
#[derive(Parser)]
#[command(name = "browse")]
struct Args {
    /// Base URL of the product service
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a listing, loading `--pages` windows
    List {
        #[command(flatten)]
        listing: ListingArgs,

        /// Number of windows to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Browse interactively
    Shop {
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Show one product
    Show { id: u64 },
    /// List the category taxonomy
    Categories,
}

#[derive(clap::Args)]
struct ListingArgs {
    /// Category slug, or `all`
    #[arg(long, default_value = "all")]
    category: CategoryFilter,

    /// Sort order (`asc` or `desc`)
    #[arg(long, default_value = "asc")]
    order: SortOrder,

    /// Field to sort by; empty for the service's own order
    #[arg(long, default_value = "price")]
    sort_by: String,

    /// Items per window
    #[arg(long, default_value_t = 5)]
    page_size: u64,
}

impl ListingArgs {
    fn filter(&self) -> ListingFilter {
        let sort_by = Some(self.sort_by.trim().to_string()).filter(|s| !s.is_empty());
        ListingFilter::new(self.category.clone(), sort_by, self.order)
    }

    fn options(&self) -> ControllerOptions {
        ControllerOptions {
            page_size: self.page_size,
            ..ControllerOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cache = Arc::new(CatalogCache::new(CacheTtls::default()));
    let catalog = Arc::new(CachedCatalog::new(HttpCatalog::new(args.base_url), cache));

    let result = match args.command {
        Command::List { listing, pages } => list(catalog, &listing, pages).await,
        Command::Shop { listing } => shop(catalog, &listing).await,
        Command::Show { id } => show(catalog.as_ref(), id).await,
        Command::Categories => categories(catalog.as_ref()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

async fn list<S: CatalogSource>(
    catalog: Arc<S>,
    listing: &ListingArgs,
    pages: u32,
) -> Result<(), CliError> {
    let mut controller = LoadMoreController::new(catalog, listing.options());
    controller.select(listing.filter()).await?;

    for _ in 1..pages {
        if !controller.has_more() {
            break;
        }
        controller.load_more().await?;
    }

    println!("-- {}", controller.filter());
    for product in controller.items() {
        println!("{}", render::product_line(product));
    }
    println!(
        "{}",
        render::progress(controller.len(), controller.total(), controller.state())
    );
    Ok(())
}

async fn shop<S: CatalogSource>(catalog: Arc<S>, listing: &ListingArgs) -> Result<(), CliError> {
    let mut controller = LoadMoreController::new(catalog, listing.options());
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    shop::run(&mut controller, listing.filter(), input, &mut out).await?;
    Ok(())
}

async fn show<S: CatalogSource>(catalog: &S, id: u64) -> Result<(), CliError> {
    let product = catalog.fetch_by_id(id).await?;
    print!("{}", render::product_detail(&product));
    Ok(())
}

async fn categories<S: CatalogSource>(catalog: &S) -> Result<(), CliError> {
    for category in catalog.fetch_categories().await? {
        println!("{}", render::category_line(&category));
    }
    Ok(())
}
