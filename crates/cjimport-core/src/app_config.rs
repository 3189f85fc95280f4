use rust_decimal::Decimal;

/// Resolved runtime configuration for an import run.
///
/// Built once by [`crate::load_app_config`] and passed explicitly to the
/// supplier client; nothing below the CLI reads the environment.
#[derive(Clone)]
pub struct AppConfig {
    pub supplier_api_base: String,
    pub supplier_email: String,
    pub supplier_api_key: String,
    /// Warehouse country code passed to the listing endpoint (e.g. `"US"`).
    pub supplier_warehouse: Option<String>,
    pub import_page_size: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Percentage added on top of the supplier sell price. `0` keeps
    /// `price == cost`.
    pub markup_percent: Decimal,
    pub user_agent: String,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supplier_api_base", &self.supplier_api_base)
            .field("supplier_email", &self.supplier_email)
            .field("supplier_api_key", &"[redacted]")
            .field("supplier_warehouse", &self.supplier_warehouse)
            .field("import_page_size", &self.import_page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("markup_percent", &self.markup_percent)
            .field("user_agent", &self.user_agent)
            .field("log_level", &self.log_level)
            .finish()
    }
}
