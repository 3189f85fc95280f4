use thiserror::Error;

/// Errors returned by the CJ Dropshipping client and transformer.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// Credentials or client settings are unusable; raised before any request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or TLS failure, including request timeouts.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response. `excerpt` is bounded so error payloads stay small.
    #[error("HTTP {status} from {path}: {excerpt}")]
    Http {
        status: u16,
        path: String,
        excerpt: String,
    },

    /// Authentication was refused, or authorization still failed after a
    /// fresh token was acquired.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// The response body is not valid JSON or does not match the expected shape.
    #[error("JSON decode error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("product not found: {external_id}")]
    NotFound { external_id: String },

    /// A supplier record could not be turned into a draft.
    #[error("invalid record {external_id}: {reason}")]
    InvalidRecord { external_id: String, reason: String },

    /// The API answered 2xx but flagged the call as unsuccessful in its envelope.
    #[error("supplier API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Envelope codes the supplier answers with (under HTTP 200) when it
/// rejects the access token rather than the request.
pub const TOKEN_REJECTED_CODES: &[i64] = &[1_600_001, 1_600_002];

impl SupplierError {
    /// `true` for HTTP 401/403 and for token-rejection envelopes, the signal
    /// to drop the held token.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 401 | 403),
            Self::Api { code, .. } => TOKEN_REJECTED_CODES.contains(code),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }

    /// `true` for errors that concern a single record and should be skipped
    /// rather than stopping an import.
    #[must_use]
    pub fn is_per_record(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidRecord { .. })
    }
}
