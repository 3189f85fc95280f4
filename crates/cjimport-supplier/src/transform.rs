//! Conversion of raw [`SupplierProduct`] records into [`ProductDraft`]s.
//!
//! Pure and deterministic: no I/O, and the same record always yields the
//! same draft. Image URLs are passed through for the store to fetch.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use cjimport_core::products::round_cents;
use cjimport_core::ProductDraft;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::SupplierError;
use crate::types::SupplierProduct;

/// Elements whose boundaries separate words in the visible text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "li", "ul", "ol", "dl", "dt", "dd", "tr", "td", "th", "table",
    "thead", "tbody", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "header",
    "footer", "blockquote", "pre",
];

/// Bare block tags as re-serialized by the cleaner. Text `<` is escaped by then.
static BLOCK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-z0-9]+>").expect("valid regex"));

/// Converts one supplier record into a draft.
///
/// # Errors
///
/// Returns [`SupplierError::InvalidRecord`] when the record has no `pid`, no
/// usable name, or a missing or non-numeric sell price.
pub fn transform(product: &SupplierProduct) -> Result<ProductDraft, SupplierError> {
    let external_id = product
        .pid
        .as_deref()
        .map(str::trim)
        .filter(|pid| !pid.is_empty())
        .ok_or_else(|| invalid(product.external_id(), "missing pid"))?
        .to_owned();

    let name = extract_name(product)
        .ok_or_else(|| invalid(&external_id, "missing productName"))?;

    let raw_price = product
        .sell_price
        .as_deref()
        .ok_or_else(|| invalid(&external_id, "missing sellPrice"))?;
    let cost = parse_price(raw_price)
        .ok_or_else(|| invalid(&external_id, &format!("non-numeric sellPrice {raw_price:?}")))?;

    let html = product
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or(product.remark.as_deref());

    let weight = product.product_weight.as_deref().and_then(|raw| {
        let parsed = normalize_weight(raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            tracing::debug!(pid = %external_id, weight = raw, "ignoring unparseable productWeight");
        }
        parsed
    });

    Ok(ProductDraft {
        name,
        price: cost,
        description: html.map(sanitize_description).unwrap_or_default(),
        weight,
        image_source: product
            .product_image
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_owned),
        sku: product
            .product_sku
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned(),
        cost,
        external_id,
    })
}

fn invalid(external_id: &str, reason: &str) -> SupplierError {
    SupplierError::InvalidRecord {
        external_id: external_id.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Picks the display name: `productName`, decoded when it is a JSON array
/// of localized strings. `productNameEn` stands in when `productName` is
/// absent or decodes to nothing.
fn extract_name(product: &SupplierProduct) -> Option<String> {
    let primary = product.product_name.as_deref().map(decode_name);
    let english = product.product_name_en.as_deref().map(decode_name);
    match (primary, english) {
        (Some(name), Some(english)) if name.is_empty() && !english.is_empty() => Some(english),
        (Some(name), _) => Some(name),
        (None, english) => english,
    }
}

/// `'["Blue Widget","蓝色小工具"]'` → `"Blue Widget"`; anything that is not
/// a JSON array led by a string is used verbatim. Always trimmed.
#[must_use]
pub fn decode_name(raw: &str) -> String {
    let decoded = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => match items.first() {
            Some(Value::String(first)) => first.clone(),
            _ => raw.to_owned(),
        },
        _ => raw.to_owned(),
    };
    decoded.trim().to_owned()
}

/// Reduces an HTML fragment to its visible text.
///
/// The fragment is parsed and re-serialized by `ammonia` with only block
/// tags kept, `<script>`/`<style>` dropped with their content and comments
/// stripped. Block tags then become word breaks, the serializer's text
/// escapes are undone and whitespace runs collapse to single spaces.
#[must_use]
pub fn sanitize_description(html: &str) -> String {
    let cleaned = ammonia::Builder::empty()
        .tags(BLOCK_TAGS.iter().copied().collect::<HashSet<_>>())
        .clean_content_tags(HashSet::from(["script", "style"]))
        .strip_comments(true)
        .clean(html)
        .to_string();
    let text = BLOCK_TAG_RE.replace_all(&cleaned, " ");
    unescape_text(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Undoes the serializer's text escaping. `&amp;` goes last so an escaped
/// literal such as `&amp;lt;` comes back as `&lt;`.
fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parses `"2.0"` as-is and a `"low-high"` range as its midpoint rounded
/// to two decimals. Blank or unparseable input yields `None`.
#[must_use]
pub fn normalize_weight(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(value) = parse_decimal(raw) {
        return Some(value);
    }
    let bounds: Vec<&str> = raw
        .split('-')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    match bounds.as_slice() {
        [low, high] => {
            let low = parse_decimal(low)?;
            let high = parse_decimal(high)?;
            Some(round_cents((low + high) / Decimal::TWO))
        }
        _ => None,
    }
}

/// Parses a sell price. Multi-variant products report a range such as
/// `"3.51 -- 4.21"`; its lower bound is used. Negative values are rejected.
fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    let value = parse_decimal(raw).or_else(|| {
        raw.split('-')
            .map(str::trim)
            .find(|part| !part.is_empty())
            .and_then(parse_decimal)
    })?;
    (!value.is_sign_negative()).then_some(value)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
