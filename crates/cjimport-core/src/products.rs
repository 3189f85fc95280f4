use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A supplier product normalized for the storefront catalog, ready to be
/// handed to a [`crate::CatalogStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Supplier product id (`pid`), kept for upserts and failure reports.
    pub external_id: String,
    /// Plain display name, trimmed. Never the JSON-encoded localized array.
    pub name: String,
    /// Storefront selling price.
    pub price: Decimal,
    /// Visible text of the supplier description with all markup removed.
    pub description: String,
    /// Representative weight; the midpoint when the supplier gives a range.
    pub weight: Option<Decimal>,
    /// Remote image URL. Downloading it is the store's job.
    pub image_source: Option<String>,
    pub sku: String,
    /// Supplier sell price.
    pub cost: Decimal,
}

impl ProductDraft {
    /// Returns a copy whose `price` is `cost` raised by `markup_percent`,
    /// rounded to cents. A zero markup leaves the draft unchanged.
    #[must_use]
    pub fn with_markup(mut self, markup_percent: Decimal) -> Self {
        if markup_percent.is_zero() {
            return self;
        }
        let factor = (Decimal::ONE_HUNDRED + markup_percent) / Decimal::ONE_HUNDRED;
        self.price = round_cents(self.cost * factor);
        self
    }
}

/// Rounds half away from zero to two decimal places.
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One record that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRecord {
    pub external_id: String,
    pub reason: String,
}

/// Running summary of an import: successes plus a reasoned list of skipped
/// records, in the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub succeeded: usize,
    pub failed: Vec<FailedRecord>,
    /// Images that could not be attached. The owning records still count as
    /// succeeded.
    pub images_failed: usize,
    pub pages_fetched: u32,
}

impl ImportResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, external_id: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(FailedRecord {
            external_id: external_id.into(),
            reason: reason.into(),
        });
    }

    /// Total records the run attempted.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}
