//! `cjimport import`: runs the paged import into a local catalog directory.

use std::path::PathBuf;

use cjimport_core::AppConfig;
use cjimport_supplier::{run_import, CatalogClient, ImportOptions, ImportReport, SupplierConfig};
use tokio_util::sync::CancellationToken;

use crate::store::{DryRunStore, JsonlStore};

/// Resolved `import` arguments; the page size already falls back to config.
#[derive(Debug)]
pub(crate) struct ImportArgs {
    pub page_size: u32,
    pub max_pages: Option<u32>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub with_details: bool,
    pub concurrency: usize,
    pub out: PathBuf,
    pub dry_run: bool,
}

/// Imports the supplier catalog and prints a summary.
///
/// Ctrl-C stops the run after the page being processed.
///
/// # Errors
///
/// Returns an error if the client or output directory cannot be set up, or
/// if the run was stopped by a supplier failure. Skipped records alone do not
/// make the command fail.
pub(crate) async fn run_import_command(config: &AppConfig, args: ImportArgs) -> anyhow::Result<()> {
    let client = CatalogClient::new(&SupplierConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build supplier client: {e}"))?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current page");
            watcher.cancel();
        }
    });

    let mut filters = client.default_filters();
    filters.category_id = args.category;
    filters.keyword = args.keyword;

    let options = ImportOptions {
        page_size: args.page_size,
        max_pages: args.max_pages,
        filters,
        fetch_details: args.with_details,
        record_concurrency: args.concurrency,
        markup_percent: config.markup_percent,
        cancel: Some(cancel),
    };
    tracing::info!(
        page_size = options.page_size,
        max_pages = ?options.max_pages,
        fetch_details = options.fetch_details,
        concurrency = options.record_concurrency,
        dry_run = args.dry_run,
        "starting import"
    );

    let report = if args.dry_run {
        run_import(&client, &DryRunStore, &options).await
    } else {
        let store = JsonlStore::open(&args.out, config)
            .await
            .map_err(|e| {
                anyhow::anyhow!("failed to open output directory {}: {e}", args.out.display())
            })?;
        println!("writing catalog to {}", store.products_path().display());
        run_import(&client, &store, &options).await
    };

    print_summary(&report);
    match report.fatal {
        Some(e) => Err(anyhow::anyhow!("import stopped early: {e}")),
        None => Ok(()),
    }
}

fn print_summary(report: &ImportReport) {
    println!("{}", summary_line(report));
    for failure in &report.result.failed {
        println!("  skipped {}: {}", failure.external_id, failure.reason);
    }
}

fn summary_line(report: &ImportReport) -> String {
    let result = &report.result;
    let status = if report.cancelled {
        "cancelled"
    } else if report.fatal.is_some() {
        "stopped"
    } else {
        "finished"
    };
    format!(
        "import {status}: {} succeeded, {} failed, {} image failures, {} pages",
        result.succeeded,
        result.failed.len(),
        result.images_failed,
        result.pages_fetched
    )
}
