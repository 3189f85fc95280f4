//! Typed product operations over [`Transport`] and [`SessionManager`].
//!
//! Each call ensures a token, retries transient failures with back-off, and
//! on an authorization failure (401/403, or a token-rejection envelope)
//! invalidates the token, re-authenticates once and repeats the request
//! once. Filters are passed to the supplier untouched.

use std::sync::Arc;

use cjimport_core::config::MAX_PAGE_SIZE;
use reqwest::Method;
use serde_json::Value;

use crate::config::SupplierConfig;
use crate::error::SupplierError;
use crate::retry::retry_with_backoff;
use crate::session::{AccessToken, SessionManager};
use crate::transport::Transport;
use crate::types::{ApiEnvelope, ProductListData, SupplierProduct};

const LIST_PATH: &str = "product/list";
const DETAIL_PATH: &str = "product/query";

/// Optional listing filters, forwarded as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    /// Warehouse country code (`countryCode`).
    pub warehouse: Option<String>,
    /// Supplier category id (`categoryId`).
    pub category_id: Option<String>,
    /// English name keyword (`productNameEn`).
    pub keyword: Option<String>,
}

impl ListFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(w) = &self.warehouse {
            pairs.push(("countryCode", w.clone()));
        }
        if let Some(c) = &self.category_id {
            pairs.push(("categoryId", c.clone()));
        }
        if let Some(k) = &self.keyword {
            pairs.push(("productNameEn", k.clone()));
        }
        pairs
    }
}

/// What [`CatalogClient::search`] looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Keyword(String),
    Category(String),
}

/// One page of the product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub page_number: u32,
    pub page_size: u32,
    /// Total matching products, when the supplier reports it.
    pub total: Option<u64>,
    pub products: Vec<SupplierProduct>,
}

/// Client for the supplier's product endpoints.
#[derive(Debug)]
pub struct CatalogClient {
    transport: Arc<Transport>,
    session: SessionManager,
    default_page_size: u32,
    default_warehouse: Option<String>,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl CatalogClient {
    /// Builds the transport and session manager from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Config`] for empty credentials or a bad base
    /// URL, and [`SupplierError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &SupplierConfig) -> Result<Self, SupplierError> {
        let transport = Arc::new(Transport::new(config)?);
        let session = SessionManager::new(Arc::clone(&transport), config.credentials.clone())?;
        Ok(Self {
            transport,
            session,
            default_page_size: config.default_page_size.clamp(1, MAX_PAGE_SIZE),
            default_warehouse: config.warehouse.clone(),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Filters pre-filled with the configured warehouse.
    #[must_use]
    pub fn default_filters(&self) -> ListFilters {
        ListFilters {
            warehouse: self.default_warehouse.clone(),
            ..ListFilters::default()
        }
    }

    /// Fetches one page of products.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::InvalidArgument`] if `page_number` is 0 or
    ///   `page_size` is outside `1..=200`.
    /// - [`SupplierError::Auth`] if authorization fails after one
    ///   re-authentication.
    /// - [`SupplierError::Api`] if the envelope reports failure.
    /// - [`SupplierError::Network`], [`SupplierError::Http`] or
    ///   [`SupplierError::Decode`] for transport failures.
    pub async fn list_products(
        &self,
        page_number: u32,
        page_size: u32,
        filters: &ListFilters,
    ) -> Result<ProductPage, SupplierError> {
        if page_number == 0 {
            return Err(SupplierError::InvalidArgument(
                "page_number must be at least 1".to_owned(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(SupplierError::InvalidArgument(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let mut query = vec![
            ("pageNum", page_number.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        query.extend(filters.query_pairs());

        let data = self
            .authorized_get(LIST_PATH, &query)
            .await?
            .unwrap_or(Value::Null);

        let list: ProductListData = if data.is_null() {
            ProductListData {
                page_num: None,
                page_size: None,
                total: Some(0),
                list: Vec::new(),
            }
        } else {
            serde_json::from_value(data).map_err(|e| SupplierError::Decode {
                context: format!("{LIST_PATH}(pageNum={page_number})"),
                source: e,
            })?
        };

        tracing::debug!(
            page_number,
            page_size,
            records = list.list.len(),
            total = ?list.total,
            "fetched product page"
        );

        Ok(ProductPage {
            page_number: list.page_num.unwrap_or(page_number),
            page_size: list.page_size.unwrap_or(page_size),
            total: list.total,
            products: list.list,
        })
    }

    /// Fetches the detail record for one product.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::NotFound`] on HTTP 404 or an empty `data` payload.
    /// - Otherwise the same errors as [`Self::list_products`].
    pub async fn get_product(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        let query = [("pid", external_id.to_owned())];
        let data = match self.authorized_get(DETAIL_PATH, &query).await {
            Ok(data) => data,
            Err(SupplierError::Http { status: 404, .. }) => {
                return Err(SupplierError::NotFound {
                    external_id: external_id.to_owned(),
                })
            }
            Err(e) => return Err(e),
        };

        match data {
            None | Some(Value::Null) => Err(SupplierError::NotFound {
                external_id: external_id.to_owned(),
            }),
            Some(value) => serde_json::from_value(value).map_err(|e| SupplierError::Decode {
                context: format!("{DETAIL_PATH}(pid={external_id})"),
                source: e,
            }),
        }
    }

    /// Returns the first page of products matching a keyword or category,
    /// using the configured default page size.
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_products`].
    pub async fn search(
        &self,
        query: &SearchQuery,
        filters: &ListFilters,
    ) -> Result<Vec<SupplierProduct>, SupplierError> {
        let mut filters = filters.clone();
        match query {
            SearchQuery::Keyword(k) => filters.keyword = Some(k.clone()),
            SearchQuery::Category(c) => filters.category_id = Some(c.clone()),
        }
        let page = self
            .list_products(1, self.default_page_size, &filters)
            .await?;
        Ok(page.products)
    }

    /// GET with token handling: one re-authentication and one repeat on a
    /// rejected token, then [`SupplierError::Auth`].
    ///
    /// Returns the envelope's `data` payload.
    async fn authorized_get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Value>, SupplierError> {
        let token = self.session.ensure_token().await?;
        match self.get_with_retry(path, query, &token).await {
            Err(err) if err.is_auth_failure() => {
                tracing::warn!(path, error = %err, "authorization rejected, re-authenticating");
                self.session.invalidate_if_current(&token).await;
                let fresh = self.session.ensure_token().await?;
                match self.get_with_retry(path, query, &fresh).await {
                    Err(err) if err.is_auth_failure() => Err(SupplierError::Auth {
                        reason: format!("authorization rejected after re-authentication: {err}"),
                    }),
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn get_with_retry(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &AccessToken,
    ) -> Result<Option<Value>, SupplierError> {
        let body = retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.transport.send(Method::GET, path, query, None, Some(token))
        })
        .await?;
        Self::unwrap_envelope(path, body)
    }

    /// Checks the success indicators and hands back `data`.
    fn unwrap_envelope(path: &str, body: Value) -> Result<Option<Value>, SupplierError> {
        let envelope: ApiEnvelope =
            serde_json::from_value(body).map_err(|e| SupplierError::Decode {
                context: path.to_owned(),
                source: e,
            })?;
        if !envelope.is_success() {
            return Err(SupplierError::Api {
                code: envelope.code.unwrap_or_default(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        Ok(envelope.data)
    }
}
