use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod import;
mod inspect;
mod store;

#[derive(Debug, Parser)]
#[command(name = "cjimport")]
#[command(about = "Import CJ Dropshipping products into a local catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import the supplier catalog page by page
    Import {
        /// Records per page (defaults to CJ_PAGE_SIZE)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
        page_size: Option<u32>,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,
        /// Only import this supplier category id
        #[arg(long)]
        category: Option<String>,
        /// Only import products whose English name matches
        #[arg(long)]
        keyword: Option<String>,
        /// Fetch each product's detail record before importing it
        #[arg(long)]
        with_details: bool,
        /// Records of one page processed at the same time
        #[arg(long, default_value_t = 1, value_parser = RangedU64ValueParser::<usize>::new().range(1..=32))]
        concurrency: usize,
        /// Directory receiving products.jsonl and images/
        #[arg(long, default_value = "catalog")]
        out: PathBuf,
        /// Log what would be stored without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch one product and print its transformed draft as JSON
    Product {
        /// Supplier product id (pid)
        pid: String,
    },
    /// List the first page of products matching a keyword or category
    Search {
        term: String,
        /// Treat TERM as a category id instead of a name keyword
        #[arg(long)]
        category: bool,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cjimport_core::load_app_config()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Import {
            page_size,
            max_pages,
            category,
            keyword,
            with_details,
            concurrency,
            out,
            dry_run,
        } => {
            let args = import::ImportArgs {
                page_size: page_size.unwrap_or(config.import_page_size),
                max_pages,
                category,
                keyword,
                with_details,
                concurrency,
                out,
                dry_run,
            };
            import::run_import_command(&config, args).await
        }
        Commands::Product { pid } => inspect::run_product(&config, &pid).await,
        Commands::Search { term, category } => inspect::run_search(&config, term, category).await,
    }
}
