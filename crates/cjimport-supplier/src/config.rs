//! Client-side settings, resolved once and passed into constructors.

use cjimport_core::AppConfig;

use crate::error::SupplierError;

/// Supplier account credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Account email.
    pub identity: String,
    /// API key.
    pub secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Checks that both fields are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Config`] naming the empty field.
    pub fn validate(&self) -> Result<(), SupplierError> {
        if self.identity.trim().is_empty() {
            return Err(SupplierError::Config(
                "supplier identity (email) is empty".to_owned(),
            ));
        }
        if self.secret.trim().is_empty() {
            return Err(SupplierError::Config(
                "supplier secret (API key) is empty".to_owned(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Everything the transport, session manager and catalog client need.
#[derive(Debug, Clone)]
pub struct SupplierConfig {
    pub api_base: String,
    pub credentials: Credentials,
    pub warehouse: Option<String>,
    pub default_page_size: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Extra attempts for network failures and 5xx responses.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub user_agent: String,
}

impl SupplierConfig {
    /// Production defaults for everything except the base URL and credentials.
    #[must_use]
    pub fn new(api_base: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            api_base: api_base.into(),
            credentials,
            warehouse: None,
            default_page_size: 20,
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            max_retries: 2,
            retry_backoff_base_ms: 500,
            user_agent: "cjimport/0.1 (catalog-import)".to_owned(),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_base: config.supplier_api_base.clone(),
            credentials: Credentials::new(&config.supplier_email, &config.supplier_api_key),
            warehouse: config.supplier_warehouse.clone(),
            default_page_size: config.import_page_size,
            request_timeout_secs: config.request_timeout_secs,
            connect_timeout_secs: config.connect_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identity_is_rejected() {
        let err = Credentials::new("  ", "key").validate().unwrap_err();
        assert!(matches!(err, SupplierError::Config(ref m) if m.contains("identity")));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = Credentials::new("buyer@example.com", "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, SupplierError::Config(ref m) if m.contains("secret")));
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("buyer@example.com", "super-secret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("buyer@example.com"));
    }
}
