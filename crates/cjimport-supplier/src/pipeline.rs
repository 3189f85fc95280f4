//! Paged import run: list, transform, store.
//!
//! [`run_import`] walks the catalog listing from page 1, hands every record
//! to a [`CatalogStore`], and keeps going past records that cannot be
//! imported. Only a failure of the listing itself (or of a detail fetch for
//! reasons other than a missing product) stops the run early.

use cjimport_core::{CatalogStore, ImportResult};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogClient, ListFilters};
use crate::error::SupplierError;
use crate::transform::transform;
use crate::types::SupplierProduct;

/// Settings for one [`run_import`] call.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub page_size: u32,
    /// Stop after this many pages. `None` runs until a short page.
    pub max_pages: Option<u32>,
    pub filters: ListFilters,
    /// Replace each listed record with its detail record before transforming.
    pub fetch_details: bool,
    /// Records of one page processed at the same time. `1` is sequential.
    pub record_concurrency: usize,
    /// Added on top of the supplier cost to form the selling price.
    pub markup_percent: Decimal,
    /// Checked before every page request.
    pub cancel: Option<CancellationToken>,
}

impl ImportOptions {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            max_pages: None,
            filters: ListFilters::default(),
            fetch_details: false,
            record_concurrency: 1,
            markup_percent: Decimal::ZERO,
            cancel: None,
        }
    }
}

/// What a run produced, including how it ended.
#[derive(Debug)]
pub struct ImportReport {
    pub result: ImportResult,
    /// Set when a catalog failure stopped the run; `result` is then partial.
    pub fatal: Option<SupplierError>,
    pub cancelled: bool,
}

impl ImportReport {
    /// `true` when the run reached the end of the listing or its page limit.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fatal.is_none() && !self.cancelled
    }
}

enum RecordOutcome {
    Imported { external_id: String, image_failed: bool },
    Skipped { external_id: String, reason: String },
    Fatal(SupplierError),
}

/// Imports every listed product into `store`.
///
/// Never returns an error: per-record problems are collected in
/// [`ImportResult::failed`], and a batch-level failure is reported through
/// [`ImportReport::fatal`] alongside whatever was imported before it.
pub async fn run_import<S: CatalogStore>(
    client: &CatalogClient,
    store: &S,
    options: &ImportOptions,
) -> ImportReport {
    let mut report = ImportReport {
        result: ImportResult::default(),
        fatal: None,
        cancelled: false,
    };
    let concurrency = options.record_concurrency.max(1);
    let mut page_number: u32 = 1;

    loop {
        if options.max_pages.is_some_and(|max| page_number > max) {
            tracing::info!(max_pages = ?options.max_pages, "page limit reached");
            break;
        }
        if options
            .cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            tracing::warn!(page = page_number, "import cancelled");
            report.cancelled = true;
            break;
        }

        let page = match client
            .list_products(page_number, options.page_size, &options.filters)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(page = page_number, error = %e, "listing failed, stopping import");
                report.fatal = Some(e);
                break;
            }
        };
        report.result.pages_fetched += 1;
        let record_count = page.products.len();
        tracing::info!(page = page_number, records = record_count, total = ?page.total, "processing page");

        let mut outcomes = stream::iter(page.products)
            .map(|product| import_record(client, store, options, product))
            .buffered(concurrency);

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                RecordOutcome::Imported {
                    external_id,
                    image_failed,
                } => {
                    tracing::debug!(pid = %external_id, "product imported");
                    report.result.record_success();
                    if image_failed {
                        report.result.images_failed += 1;
                    }
                }
                RecordOutcome::Skipped {
                    external_id,
                    reason,
                } => {
                    tracing::warn!(pid = %external_id, reason = %reason, "skipping product");
                    report.result.record_failure(external_id, reason);
                }
                RecordOutcome::Fatal(e) => {
                    tracing::error!(page = page_number, error = %e, "detail fetch failed, stopping import");
                    report.fatal = Some(e);
                    break;
                }
            }
        }
        if report.fatal.is_some() {
            break;
        }

        if record_count < options.page_size as usize {
            break;
        }
        page_number += 1;
    }

    tracing::info!(
        succeeded = report.result.succeeded,
        failed = report.result.failed.len(),
        images_failed = report.result.images_failed,
        pages = report.result.pages_fetched,
        cancelled = report.cancelled,
        fatal = report.fatal.is_some(),
        "import finished"
    );
    report
}

async fn import_record<S: CatalogStore>(
    client: &CatalogClient,
    store: &S,
    options: &ImportOptions,
    listed: SupplierProduct,
) -> RecordOutcome {
    let product = match (options.fetch_details, listed.pid.clone()) {
        (true, Some(pid)) => match client.get_product(&pid).await {
            Ok(detail) => detail,
            Err(e) if e.is_per_record() => {
                return RecordOutcome::Skipped {
                    external_id: pid,
                    reason: e.to_string(),
                }
            }
            Err(e) => return RecordOutcome::Fatal(e),
        },
        // Without a pid there is nothing to look up; the transformer reports it.
        _ => listed,
    };

    let draft = match transform(&product) {
        Ok(draft) => draft.with_markup(options.markup_percent),
        Err(e) => {
            return RecordOutcome::Skipped {
                external_id: product.external_id().to_owned(),
                reason: e.to_string(),
            }
        }
    };

    let stored = match store.create_or_update(&draft).await {
        Ok(id) => id,
        Err(e) => {
            return RecordOutcome::Skipped {
                external_id: draft.external_id,
                reason: e.to_string(),
            }
        }
    };

    let mut image_failed = false;
    if let Some(url) = draft.image_source.as_deref() {
        if let Err(e) = store.attach_image(&stored, url).await {
            tracing::warn!(pid = %draft.external_id, url, error = %e, "image attach failed");
            image_failed = true;
        }
    }

    RecordOutcome::Imported {
        external_id: draft.external_id,
        image_failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_sequential_without_markup() {
        let options = ImportOptions::new(50);
        assert_eq!(options.page_size, 50);
        assert_eq!(options.record_concurrency, 1);
        assert!(options.max_pages.is_none());
        assert!(!options.fetch_details);
        assert!(options.markup_percent.is_zero());
    }

    #[test]
    fn report_with_fatal_error_is_incomplete() {
        let report = ImportReport {
            result: ImportResult::default(),
            fatal: Some(SupplierError::Auth {
                reason: "rejected".to_owned(),
            }),
            cancelled: false,
        };
        assert!(!report.is_complete());
    }

    #[test]
    fn cancelled_report_is_incomplete() {
        let report = ImportReport {
            result: ImportResult::default(),
            fatal: None,
            cancelled: true,
        };
        assert!(!report.is_complete());
    }
}
