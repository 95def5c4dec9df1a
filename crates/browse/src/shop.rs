use crate::render;
use catalog::{CatalogSource, CategoryFilter, ListingFilter, LoadMoreController, LoadState, SortOrder};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopCommand {
    More,
    Category(CategoryFilter),
    Order(SortOrder),
    Show(u64),
    Help,
    Quit,
}

impl ShopCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("more");
        let arg = words.next();

        match (command, arg) {
            ("more" | "m", None) => Ok(ShopCommand::More),
            ("category" | "c", Some(slug)) => slug
                .parse()
                .map(ShopCommand::Category)
                .map_err(|e| format!("{e}")),
            ("order" | "o", Some(order)) => order
                .parse()
                .map(ShopCommand::Order)
                .map_err(|e| format!("{e}")),
            ("show" | "s", Some(id)) => id
                .parse()
                .map(ShopCommand::Show)
                .map_err(|_| format!("invalid product id {id:?}")),
            ("help" | "?", None) => Ok(ShopCommand::Help),
            ("quit" | "q" | "exit", None) => Ok(ShopCommand::Quit),
            _ => Err(format!("unrecognised command {:?}, type help", line.trim())),
        }
    }
}

const HELP: &str = "\
commands:
  more (or empty line)   load the next page
  category <slug|all>    switch category
  order <asc|desc>       switch sort order
  show <id>              product details
  quit";

/// Run the session until `quit` or end of input.
///
/// Fetch errors are reported and the session carries on; a failed load can
/// be retried with `more`.
pub async fn run<S, R, W>(
    controller: &mut LoadMoreController<S>,
    initial: ListingFilter,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    S: CatalogSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{HELP}")?;
    switch(controller, initial, out).await?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match ShopCommand::parse(&line) {
            Ok(c) => c,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        match command {
            ShopCommand::More => more(controller, out).await?,
            ShopCommand::Category(category) => {
                let filter = ListingFilter {
                    category,
                    ..controller.filter().clone()
                };
                switch(controller, filter, out).await?;
            }
            ShopCommand::Order(order) => {
                let filter = ListingFilter {
                    order,
                    ..controller.filter().clone()
                };
                switch(controller, filter, out).await?;
            }
            ShopCommand::Show(id) => match controller.source().fetch_by_id(id).await {
                Ok(product) => write!(out, "{}", render::product_detail(&product))?,
                Err(e) => {
                    tracing::warn!(id, error = %e, "product lookup failed");
                    writeln!(out, "error: {e}")?
                }
            },
            ShopCommand::Help => writeln!(out, "{HELP}")?,
            ShopCommand::Quit => break,
        }
    }
    Ok(())
}

async fn switch<S: CatalogSource, W: Write>(
    controller: &mut LoadMoreController<S>,
    filter: ListingFilter,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "-- {filter}")?;
    let result = controller.select(filter).await;
    print_from(controller, 0, result, out)
}

async fn more<S: CatalogSource, W: Write>(
    controller: &mut LoadMoreController<S>,
    out: &mut W,
) -> std::io::Result<()> {
    if controller.state() == LoadState::Exhausted {
        return writeln!(out, "no more products");
    }
    let shown = controller.len();
    let result = controller.load_more().await;
    print_from(controller, shown, result, out)
}

fn print_from<S: CatalogSource, W: Write>(
    controller: &LoadMoreController<S>,
    from: usize,
    result: Result<LoadState, catalog::CatalogError>,
    out: &mut W,
) -> std::io::Result<()> {
    if let Err(e) = result {
        tracing::warn!(filter = %controller.filter(), error = %e, "listing fetch failed");
        writeln!(out, "error: {e}")?;
    }
    for product in &controller.items()[from..] {
        writeln!(out, "{}", render::product_line(product))?;
    }
    writeln!(
        out,
        "{}",
        render::progress(controller.len(), controller.total(), controller.state())
    )
}
