//! Access-token lifecycle for the CJ Dropshipping API.
//!
//! The supplier issues no usable expiry, so refresh is reactive: the token is
//! held until a caller reports an authorization failure, then re-acquired on
//! the next [`SessionManager::ensure_token`]. Authentication runs while the
//! session lock is held, so concurrent callers wait for the one in-flight
//! request instead of issuing their own.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::Credentials;
use crate::error::SupplierError;
use crate::transport::Transport;
use crate::types::{ApiEnvelope, AuthData};

pub(crate) const AUTH_PATH: &str = "authentication/getAccessToken";

/// Opaque session token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

#[derive(Debug, Clone)]
struct Session {
    token: AccessToken,
    acquired_at: DateTime<Utc>,
}

/// Owns the supplier session token.
#[derive(Debug)]
pub struct SessionManager {
    transport: Arc<Transport>,
    credentials: Credentials,
    session: Mutex<Option<Session>>,
    authentications: AtomicU32,
}

impl SessionManager {
    /// Creates an unauthenticated manager.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Config`] if either credential field is empty.
    pub fn new(transport: Arc<Transport>, credentials: Credentials) -> Result<Self, SupplierError> {
        credentials.validate()?;
        Ok(Self {
            transport,
            credentials,
            session: Mutex::new(None),
            authentications: AtomicU32::new(0),
        })
    }

    /// Returns the held token, authenticating first if there is none.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::Auth`] if the supplier rejects the credentials or
    ///   answers without a token.
    /// - [`SupplierError::Network`], [`SupplierError::Http`] or
    ///   [`SupplierError::Decode`] if the authentication call itself fails.
    pub async fn ensure_token(&self) -> Result<AccessToken, SupplierError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.token.clone());
        }

        let session = self.authenticate().await?;
        let token = session.token.clone();
        *guard = Some(session);
        Ok(token)
    }

    /// Drops the held token unconditionally.
    pub async fn invalidate(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            tracing::info!("supplier session invalidated");
        }
    }

    /// Drops the held token only if it is still `stale`.
    ///
    /// A caller that saw `stale` rejected must not discard a newer token some
    /// other caller has already acquired.
    pub async fn invalidate_if_current(&self, stale: &AccessToken) {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|s| &s.token == stale) {
            let age_secs = guard
                .as_ref()
                .map_or(0, |s| (Utc::now() - s.acquired_at).num_seconds());
            *guard = None;
            tracing::info!(age_secs, "supplier session invalidated after authorization failure");
        }
    }

    /// When the held token was acquired, if there is one.
    pub async fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.as_ref().map(|s| s.acquired_at)
    }

    /// Number of successful authentications so far.
    #[must_use]
    pub fn authentication_count(&self) -> u32 {
        self.authentications.load(Ordering::SeqCst)
    }

    async fn authenticate(&self) -> Result<Session, SupplierError> {
        let body = json!({
            "email": self.credentials.identity,
            "apiKey": self.credentials.secret,
        });

        let response = match self
            .transport
            .send(Method::POST, AUTH_PATH, &[], Some(&body), None)
            .await
        {
            Ok(value) => value,
            Err(SupplierError::Http {
                status: status @ (401 | 403),
                excerpt,
                ..
            }) => {
                return Err(SupplierError::Auth {
                    reason: format!("credentials rejected (HTTP {status}): {excerpt}"),
                })
            }
            Err(e) => return Err(e),
        };

        let envelope: ApiEnvelope =
            serde_json::from_value(response).map_err(|e| SupplierError::Decode {
                context: AUTH_PATH.to_owned(),
                source: e,
            })?;

        let reported = envelope
            .message
            .clone()
            .unwrap_or_else(|| "no message from supplier".to_owned());

        if !envelope.is_success() {
            return Err(SupplierError::Auth { reason: reported });
        }

        let data: AuthData = envelope
            .data
            .and_then(|d| serde_json::from_value(d).ok())
            .unwrap_or_default();
        let token = data
            .access_token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SupplierError::Auth {
                reason: format!("response carried no access token: {reported}"),
            })?;

        let count = self.authentications.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(authentications = count, "supplier session established");

        Ok(Session {
            token: AccessToken(token),
            acquired_at: Utc::now(),
        })
    }
}

#[cfg(test)]
impl AccessToken {
    pub(crate) fn for_test(value: &str) -> Self {
        Self(value.to_owned())
    }
}
