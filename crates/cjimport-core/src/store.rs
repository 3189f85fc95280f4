//! Contract for the catalog persistence collaborator.

use std::fmt;
use std::future::Future;

use crate::error::StoreError;
use crate::products::ProductDraft;

/// Identifier assigned to a draft by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredProductId(pub String);

impl fmt::Display for StoredProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists product drafts produced by an import run.
///
/// Implementations decide what "create or update" means (keyed on
/// [`ProductDraft::external_id`] is the usual choice) and how images are
/// fetched. Every error is treated as a per-record failure by the pipeline.
pub trait CatalogStore {
    /// Inserts the draft or updates the product previously stored for the
    /// same external id.
    fn create_or_update(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<StoredProductId, StoreError>> + Send;

    /// Retrieves the image at `source_url` and attaches it to `id`.
    fn attach_image(
        &self,
        id: &StoredProductId,
        source_url: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
