//! Client and import pipeline for the CJ Dropshipping product API.
//!
//! [`CatalogClient`] wraps the HTTP [`transport`] and the token-owning
//! [`SessionManager`]; [`transform`] turns raw supplier records into
//! [`cjimport_core::ProductDraft`]s; [`run_import`] drives pagination and hands
//! drafts to a [`cjimport_core::CatalogStore`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod transform;
pub mod transport;
pub mod types;

mod retry;

pub use catalog::{CatalogClient, ListFilters, ProductPage, SearchQuery};
pub use config::{Credentials, SupplierConfig};
pub use error::SupplierError;
pub use pipeline::{run_import, ImportOptions, ImportReport};
pub use session::{AccessToken, SessionManager};
pub use transform::transform;
pub use types::SupplierProduct;
