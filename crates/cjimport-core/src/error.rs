use thiserror::Error;

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors reported by a [`crate::CatalogStore`] implementation.
///
/// Both variants are per-record: the import pipeline records them and moves
/// on to the next product.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to fetch image {source_url}: {reason}")]
    ImageFetch { source_url: String, reason: String },
}
