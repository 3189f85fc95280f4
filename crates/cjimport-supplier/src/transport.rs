//! HTTP transport for the CJ Dropshipping REST API.
//!
//! Builds endpoint URLs under the configured base, attaches the JSON and
//! access-token headers, and classifies failures into [`SupplierError`]
//! variants. It never retries; callers with semantic context decide that.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde_json::Value;

use crate::config::SupplierConfig;
use crate::error::SupplierError;
use crate::session::AccessToken;

/// Header carrying the session token on authenticated calls.
pub const ACCESS_TOKEN_HEADER: &str = "CJ-Access-Token";

/// Upper bound on the error-body excerpt kept in [`SupplierError::Http`].
const MAX_EXCERPT_CHARS: usize = 512;

/// Thin wrapper over `reqwest` bound to one API base URL.
#[derive(Debug)]
pub struct Transport {
    client: Client,
    base_url: Url,
}

impl Transport {
    /// Creates a transport with the configured timeouts and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Network`] if the `reqwest::Client` cannot be
    /// built, or [`SupplierError::Config`] if `api_base` is not a valid URL.
    pub fn new(config: &SupplierConfig) -> Result<Self, SupplierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        // Exactly one trailing slash so `join` appends below the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", config.api_base.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            SupplierError::Config(format!("invalid API base URL '{}': {e}", config.api_base))
        })?;

        Ok(Self { client, base_url })
    }

    /// Sends one request and returns the parsed JSON body.
    ///
    /// `token`, when present, is sent in the [`ACCESS_TOKEN_HEADER`] header.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::Network`] on connection failure or timeout.
    /// - [`SupplierError::Http`] on a non-2xx status.
    /// - [`SupplierError::Decode`] if a 2xx body is not valid JSON.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<&AccessToken>,
    ) -> Result<Value, SupplierError> {
        let url = self.endpoint_url(path, query)?;
        tracing::debug!(%method, path, "supplier request");

        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(ACCESS_TOKEN_HEADER, token.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(SupplierError::Http {
                status: status.as_u16(),
                path: path.to_owned(),
                excerpt: error_excerpt(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| SupplierError::Decode {
            context: path.to_owned(),
            source: e,
        })
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, SupplierError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SupplierError::InvalidArgument(format!("invalid path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// Summarises an error body: the supplier `message` when the body is JSON,
/// otherwise the raw text, capped at [`MAX_EXCERPT_CHARS`].
fn error_excerpt(body: &str) -> String {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| json.to_string(), str::to_owned),
        Err(_) => body.trim().to_owned(),
    };
    truncate_chars(&text, MAX_EXCERPT_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn test_transport(base: &str) -> Transport {
        let config = SupplierConfig::new(base, Credentials::new("buyer@example.com", "key"));
        Transport::new(&config).expect("transport construction should not fail")
    }

    #[test]
    fn endpoint_url_keeps_base_path() {
        let transport = test_transport("https://developers.cjdropshipping.com/api2.0/v1");
        let url = transport
            .endpoint_url("product/list", &[("pageNum", "1".to_owned())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://developers.cjdropshipping.com/api2.0/v1/product/list?pageNum=1"
        );
    }

    #[test]
    fn endpoint_url_tolerates_slashes() {
        let transport = test_transport("https://example.com/api/");
        let url = transport.endpoint_url("/product/query", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/product/query");
    }

    #[test]
    fn endpoint_url_encodes_query_values() {
        let transport = test_transport("https://example.com/api");
        let url = transport
            .endpoint_url("product/list", &[("productNameEn", "led & lamp".to_owned())])
            .unwrap();
        assert!(
            url.as_str().contains("led+%26+lamp"),
            "query value should be percent-encoded: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = SupplierConfig::new("not a url", Credentials::new("a@b.c", "k"));
        assert!(matches!(
            Transport::new(&config),
            Err(SupplierError::Config(_))
        ));
    }

    #[test]
    fn excerpt_prefers_json_message() {
        let body = r#"{"code":1600001,"result":false,"message":"Invalid token"}"#;
        assert_eq!(error_excerpt(body), "Invalid token");
    }

    #[test]
    fn excerpt_is_capped_for_non_json_bodies() {
        let body = "x".repeat(2_000);
        let excerpt = error_excerpt(&body);
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 1);
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("蓝色小工具", 2), "蓝色…");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
