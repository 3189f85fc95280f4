//! Shared types for the CJ Dropshipping catalog import.
//!
//! Holds the application configuration, the normalized [`ProductDraft`]
//! produced by the supplier transformer, the [`ImportResult`] summary, and
//! the [`CatalogStore`] contract implemented by whatever persists drafts.

pub mod app_config;
pub mod config;
pub mod error;
pub mod products;
pub mod store;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, StoreError};
pub use products::{FailedRecord, ImportResult, ProductDraft};
pub use store::{CatalogStore, StoredProductId};
