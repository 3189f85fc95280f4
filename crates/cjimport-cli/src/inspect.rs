//! `cjimport product` and `cjimport search`: look at supplier data without
//! importing it.

use cjimport_core::AppConfig;
use cjimport_supplier::transform::decode_name;
use cjimport_supplier::{transform, CatalogClient, SearchQuery, SupplierConfig, SupplierProduct};

fn build_client(config: &AppConfig) -> anyhow::Result<CatalogClient> {
    CatalogClient::new(&SupplierConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build supplier client: {e}"))
}

/// Fetches one product and prints the draft an import would store.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or transformed.
pub(crate) async fn run_product(config: &AppConfig, pid: &str) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let product = client
        .get_product(pid)
        .await
        .map_err(|e| anyhow::anyhow!("failed to fetch product {pid}: {e}"))?;
    let draft = transform(&product)
        .map_err(|e| anyhow::anyhow!("product {pid} cannot be imported: {e}"))?
        .with_markup(config.markup_percent);

    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

/// Prints the first page of products matching `term`.
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub(crate) async fn run_search(
    config: &AppConfig,
    term: String,
    by_category: bool,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let query = if by_category {
        SearchQuery::Category(term)
    } else {
        SearchQuery::Keyword(term)
    };
    let products = client
        .search(&query, &client.default_filters())
        .await
        .map_err(|e| anyhow::anyhow!("search failed: {e}"))?;

    if products.is_empty() {
        println!("no products found");
        return Ok(());
    }
    for product in &products {
        println!("{}", search_row(product));
    }
    println!("{} products", products.len());
    Ok(())
}

/// `pid  sku  price  name`, tolerating records an import would reject.
fn search_row(product: &SupplierProduct) -> String {
    let name = product
        .product_name
        .as_deref()
        .or(product.product_name_en.as_deref())
        .map(decode_name)
        .unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}",
        product.external_id(),
        product.product_sku.as_deref().unwrap_or("-"),
        product.sell_price.as_deref().unwrap_or("-"),
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_row_decodes_localized_name() {
        let product = SupplierProduct {
            pid: Some("p-1".to_owned()),
            product_name: Some(r#"["Desk Lamp","台灯"]"#.to_owned()),
            product_sku: Some("CJ-LAMP-1".to_owned()),
            sell_price: Some("3.51 -- 4.21".to_owned()),
            ..SupplierProduct::default()
        };
        assert_eq!(search_row(&product), "p-1\tCJ-LAMP-1\t3.51 -- 4.21\tDesk Lamp");
    }

    #[test]
    fn search_row_fills_missing_fields() {
        let product = SupplierProduct::default();
        assert_eq!(search_row(&product), "<unknown>\t-\t-\t");
    }
}
