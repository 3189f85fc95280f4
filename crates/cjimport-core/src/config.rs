use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_API_BASE: &str = "https://developers.cjdropshipping.com/api2.0/v1";

/// Largest page the supplier listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        let value = lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(trimmed.to_string())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let supplier_email = require("CJ_EMAIL")?;
    let supplier_api_key = require("CJ_API_KEY")?;
    let supplier_api_base = or_default("CJ_API_BASE", DEFAULT_API_BASE);
    let supplier_warehouse = lookup("CJ_WAREHOUSE")
        .ok()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty());

    let import_page_size = parse_u32("CJ_PAGE_SIZE", "20")?;
    if !(1..=MAX_PAGE_SIZE).contains(&import_page_size) {
        return Err(ConfigError::InvalidEnvVar {
            var: "CJ_PAGE_SIZE".to_string(),
            reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
        });
    }

    let request_timeout_secs = parse_u64("CJ_REQUEST_TIMEOUT_SECS", "10")?;
    let connect_timeout_secs = parse_u64("CJ_CONNECT_TIMEOUT_SECS", "5")?;
    let max_retries = parse_u32("CJ_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("CJ_RETRY_BACKOFF_BASE_MS", "500")?;

    let markup_raw = or_default("CJ_MARKUP_PERCENT", "0");
    let markup_percent =
        Decimal::from_str(markup_raw.trim()).map_err(|e| ConfigError::InvalidEnvVar {
            var: "CJ_MARKUP_PERCENT".to_string(),
            reason: e.to_string(),
        })?;
    if markup_percent.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar {
            var: "CJ_MARKUP_PERCENT".to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    let user_agent = or_default("CJ_USER_AGENT", "cjimport/0.1 (catalog-import)");
    let log_level = or_default("CJIMPORT_LOG_LEVEL", "info");

    Ok(AppConfig {
        supplier_api_base,
        supplier_email,
        supplier_api_key,
        supplier_warehouse,
        import_page_size,
        request_timeout_secs,
        connect_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        markup_percent,
        user_agent,
        log_level,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
