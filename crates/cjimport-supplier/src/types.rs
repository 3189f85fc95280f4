//! CJ Dropshipping API response types.
//!
//! Every response is wrapped in `{"code", "result", "success", "message",
//! "data"}`. Product records are loosely typed upstream (prices and weights
//! arrive as strings or numbers, ids as strings or integers), so
//! [`SupplierProduct`] reads every field through [`lenient_string`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    /// The envelope counts as successful when any success indicator is
    /// `true` and none is `false`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match (self.success, self.result) {
            (Some(false), _) | (_, Some(false)) | (None, None) => false,
            _ => true,
        }
    }
}

/// `data` of the access-token endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// `data` of the product listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListData {
    #[serde(default)]
    pub page_num: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub list: Vec<SupplierProduct>,
}

/// A raw product record as the supplier returns it.
///
/// All fields are optional; required ones are enforced by
/// [`crate::transform`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub pid: Option<String>,
    /// Often a JSON-encoded array of localized names, e.g. `["Blue Widget","蓝色小工具"]`.
    #[serde(rename = "productName", default, deserialize_with = "lenient_string")]
    pub product_name: Option<String>,
    #[serde(rename = "productNameEn", default, deserialize_with = "lenient_string")]
    pub product_name_en: Option<String>,
    #[serde(rename = "productSku", default, deserialize_with = "lenient_string")]
    pub product_sku: Option<String>,
    #[serde(rename = "productImage", default, deserialize_with = "lenient_string")]
    pub product_image: Option<String>,
    /// Grams; either a single value or a `"low-high"` range.
    #[serde(rename = "productWeight", default, deserialize_with = "lenient_string")]
    pub product_weight: Option<String>,
    #[serde(rename = "sellPrice", default, deserialize_with = "lenient_string")]
    pub sell_price: Option<String>,
    /// HTML description (detail endpoint).
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// HTML remark (listing endpoint).
    #[serde(default, deserialize_with = "lenient_string")]
    pub remark: Option<String>,
    #[serde(rename = "categoryId", default, deserialize_with = "lenient_string")]
    pub category_id: Option<String>,
    #[serde(rename = "categoryName", default, deserialize_with = "lenient_string")]
    pub category_name: Option<String>,
    #[serde(
        rename = "warehouseCode",
        alias = "countryCode",
        default,
        deserialize_with = "lenient_string"
    )]
    pub warehouse_code: Option<String>,
}

impl SupplierProduct {
    /// External id for logs and failure reports.
    #[must_use]
    pub fn external_id(&self) -> &str {
        self.pid.as_deref().unwrap_or("<unknown>")
    }
}

/// Reads a string, number, or any other JSON value into `Option<String>`.
///
/// Strings pass through, `null` becomes `None`, and every other value is
/// kept in its compact JSON form so no field can fail a whole page.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
