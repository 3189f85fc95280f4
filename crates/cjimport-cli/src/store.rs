//! [`CatalogStore`] implementations used by the `import` command.
//!
//! [`JsonlStore`] appends each draft as one JSON line to
//! `<out>/products.jsonl` and downloads images into `<out>/images/`. A later
//! line for the same `external_id` supersedes earlier ones, which is how a
//! re-import updates a product. [`DryRunStore`] only logs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cjimport_core::{AppConfig, CatalogStore, ProductDraft, StoreError, StoredProductId};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const PRODUCTS_FILE: &str = "products.jsonl";
const IMAGES_DIR: &str = "images";

/// Append-only JSON-lines catalog with a sibling image directory.
#[derive(Debug)]
pub(crate) struct JsonlStore {
    products_path: PathBuf,
    images_dir: PathBuf,
    file: Mutex<File>,
    http: reqwest::Client,
}

impl JsonlStore {
    /// Creates `out_dir` and `out_dir/images` if needed and opens the
    /// products file for appending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the directories or file cannot be
    /// created, or the image download client cannot be built.
    pub(crate) async fn open(out_dir: &Path, config: &AppConfig) -> Result<Self, StoreError> {
        let images_dir = out_dir.join(IMAGES_DIR);
        fs::create_dir_all(&images_dir)
            .await
            .map_err(|e| StoreError::Storage(format!("create {}: {e}", images_dir.display())))?;

        let products_path = out_dir.join(PRODUCTS_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&products_path)
            .await
            .map_err(|e| StoreError::Storage(format!("open {}: {e}", products_path.display())))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| StoreError::Storage(format!("image client: {e}")))?;

        Ok(Self {
            products_path,
            images_dir,
            file: Mutex::new(file),
            http,
        })
    }

    pub(crate) fn products_path(&self) -> &Path {
        &self.products_path
    }

    async fn download_image(&self, source_url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        if bytes.is_empty() {
            return Err("empty body".to_owned());
        }
        Ok(bytes.to_vec())
    }
}

impl CatalogStore for JsonlStore {
    async fn create_or_update(&self, draft: &ProductDraft) -> Result<StoredProductId, StoreError> {
        let mut line = serde_json::to_string(draft)
            .map_err(|e| StoreError::Storage(format!("serialize {}: {e}", draft.external_id)))?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::Storage(format!("write {}: {e}", self.products_path.display())))?;
        file.flush()
            .await
            .map_err(|e| StoreError::Storage(format!("flush {}: {e}", self.products_path.display())))?;

        Ok(StoredProductId(draft.external_id.clone()))
    }

    async fn attach_image(&self, id: &StoredProductId, source_url: &str) -> Result<(), StoreError> {
        let fetch_error = |reason: String| StoreError::ImageFetch {
            source_url: source_url.to_owned(),
            reason,
        };

        let bytes = self.download_image(source_url).await.map_err(fetch_error)?;
        let target = self
            .images_dir
            .join(format!("{}.{}", file_stem(&id.0), image_extension(source_url)));
        fs::write(&target, &bytes)
            .await
            .map_err(|e| fetch_error(format!("write {}: {e}", target.display())))?;

        tracing::debug!(id = %id, path = %target.display(), bytes = bytes.len(), "image saved");
        Ok(())
    }
}

/// Logs drafts instead of storing them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DryRunStore;

impl CatalogStore for DryRunStore {
    async fn create_or_update(&self, draft: &ProductDraft) -> Result<StoredProductId, StoreError> {
        tracing::info!(
            pid = %draft.external_id,
            name = %draft.name,
            price = %draft.price,
            cost = %draft.cost,
            "dry-run: would store product"
        );
        Ok(StoredProductId(draft.external_id.clone()))
    }

    async fn attach_image(&self, id: &StoredProductId, source_url: &str) -> Result<(), StoreError> {
        tracing::info!(id = %id, url = source_url, "dry-run: would attach image");
        Ok(())
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "product".to_owned()
    } else {
        stem
    }
}

/// Extension of the URL's last path segment when it looks like an image
/// format, `jpg` otherwise.
fn image_extension(source_url: &str) -> &'static str {
    let path = source_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "png",
        Some("gif") => "gif",
        Some("webp") => "webp",
        Some("jpeg") => "jpeg",
        _ => "jpg",
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
