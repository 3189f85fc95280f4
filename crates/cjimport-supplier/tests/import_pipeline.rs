//! Integration tests for `run_import` against a mocked supplier and an
//! in-memory store.

use std::str::FromStr;
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cjimport_core::{CatalogStore, ProductDraft, StoreError, StoredProductId};
use cjimport_supplier::{
    run_import, CatalogClient, Credentials, ImportOptions, SupplierConfig, SupplierError,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStore {
    drafts: Mutex<Vec<ProductDraft>>,
    images: Mutex<Vec<(StoredProductId, String)>>,
    reject_ids: Vec<String>,
    fail_images: bool,
    /// Cancelled as soon as the first draft is stored.
    cancel_on_first: Option<CancellationToken>,
}

impl MemoryStore {
    fn stored_ids(&self) -> Vec<String> {
        self.drafts
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.external_id.clone())
            .collect()
    }

    fn draft(&self, external_id: &str) -> ProductDraft {
        self.drafts
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.external_id == external_id)
            .cloned()
            .expect("draft should have been stored")
    }
}

impl CatalogStore for MemoryStore {
    async fn create_or_update(&self, draft: &ProductDraft) -> Result<StoredProductId, StoreError> {
        if self.reject_ids.contains(&draft.external_id) {
            return Err(StoreError::Storage(format!(
                "duplicate handle for {}",
                draft.external_id
            )));
        }
        self.drafts.lock().unwrap().push(draft.clone());
        if let Some(token) = &self.cancel_on_first {
            token.cancel();
        }
        Ok(StoredProductId(format!("local-{}", draft.external_id)))
    }

    async fn attach_image(&self, id: &StoredProductId, source_url: &str) -> Result<(), StoreError> {
        if self.fail_images {
            return Err(StoreError::ImageFetch {
                source_url: source_url.to_owned(),
                reason: "HTTP 404".to_owned(),
            });
        }
        self.images
            .lock()
            .unwrap()
            .push((id.clone(), source_url.to_owned()));
        Ok(())
    }
}

fn test_client(server: &MockServer) -> CatalogClient {
    let mut config = SupplierConfig::new(
        server.uri(),
        Credentials::new("buyer@example.com", "test-api-key"),
    );
    config.max_retries = 0;
    config.retry_backoff_base_ms = 1;
    CatalogClient::new(&config).expect("failed to build test CatalogClient")
}

fn envelope(data: Value) -> Value {
    json!({
        "code": 200,
        "result": true,
        "success": true,
        "message": "Success",
        "data": data
    })
}

fn product(pid: &str, price: &str) -> Value {
    json!({
        "pid": pid,
        "productName": format!("[\"Product {pid}\"]"),
        "productSku": format!("SKU-{pid}"),
        "productImage": format!("https://cf.cjdropshipping.com/{pid}.jpg"),
        "sellPrice": price,
        "remark": "<p>Listing remark</p>"
    })
}

fn page(products: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(envelope(json!({
        "pageNum": 1,
        "pageSize": 2,
        "total": 100,
        "list": products
    })))
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/authentication/getAccessToken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({ "accessToken": "tok-1" }))),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_number: u32, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/product/list"))
        .and(query_param("pageNum", page_number.to_string()))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_record_is_skipped_and_page_limit_is_respected() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, page(vec![product("p-3", "3.00"), product("p-4", "N/A")]), 1).await;
    mount_page(&server, 3, page(vec![product("p-5", "5.00"), product("p-6", "6.00")]), 1).await;
    mount_page(&server, 4, page(vec![product("p-7", "7.00")]), 0).await;

    let client = test_client(&server);
    let store = MemoryStore::default();
    let mut options = ImportOptions::new(2);
    options.max_pages = Some(3);

    let report = run_import(&client, &store, &options).await;

    assert!(report.is_complete(), "unexpected outcome: {report:?}");
    assert_eq!(report.result.succeeded, 5);
    assert_eq!(report.result.pages_fetched, 3);
    assert_eq!(report.result.failed.len(), 1);
    assert_eq!(report.result.failed[0].external_id, "p-4");
    assert!(report.result.failed[0].reason.contains("sellPrice"));
    assert_eq!(store.stored_ids(), ["p-1", "p-2", "p-3", "p-5", "p-6"]);
    assert_eq!(store.images.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn short_page_ends_the_run() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, page(vec![product("p-3", "3.00")]), 1).await;
    mount_page(&server, 3, page(vec![product("p-4", "4.00")]), 0).await;

    let client = test_client(&server);
    let store = MemoryStore::default();

    let report = run_import(&client, &store, &ImportOptions::new(2)).await;

    assert!(report.is_complete());
    assert_eq!(report.result.succeeded, 3);
    assert_eq!(report.result.pages_fetched, 2);
    assert!(report.result.failed.is_empty());
}

#[tokio::test]
async fn empty_listing_imports_nothing() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![]), 1).await;

    let client = test_client(&server);
    let store = MemoryStore::default();

    let report = run_import(&client, &store, &ImportOptions::new(2)).await;

    assert!(report.is_complete());
    assert_eq!(report.result.processed(), 0);
    assert_eq!(report.result.pages_fetched, 1);
}

#[tokio::test]
async fn listing_failure_stops_run_with_partial_result() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, ResponseTemplate::new(500), 1).await;
    mount_page(&server, 3, page(vec![]), 0).await;

    let client = test_client(&server);
    let store = MemoryStore::default();

    let report = run_import(&client, &store, &ImportOptions::new(2)).await;

    assert!(!report.is_complete());
    assert!(
        matches!(report.fatal, Some(SupplierError::Http { status: 500, .. })),
        "got {:?}",
        report.fatal
    );
    assert_eq!(report.result.succeeded, 2);
    assert_eq!(report.result.pages_fetched, 1);
}

#[tokio::test]
async fn cancellation_stops_at_the_next_page_boundary() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, page(vec![product("p-3", "3.00")]), 0).await;

    let cancel = CancellationToken::new();
    let client = test_client(&server);
    let store = MemoryStore {
        cancel_on_first: Some(cancel.clone()),
        ..MemoryStore::default()
    };
    let mut options = ImportOptions::new(2);
    options.cancel = Some(cancel);

    let report = run_import(&client, &store, &options).await;

    assert!(report.cancelled);
    assert!(report.fatal.is_none());
    // The page in flight is finished before the token is observed.
    assert_eq!(report.result.succeeded, 2);
    assert_eq!(report.result.pages_fetched, 1);
}

// ---------------------------------------------------------------------------
// Per-record handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_and_image_failures_do_not_stop_the_page() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, page(vec![product("p-3", "3.00")]), 1).await;

    let client = test_client(&server);
    let store = MemoryStore {
        reject_ids: vec!["p-2".to_owned()],
        fail_images: true,
        ..MemoryStore::default()
    };

    let report = run_import(&client, &store, &ImportOptions::new(2)).await;

    assert!(report.is_complete());
    assert_eq!(report.result.succeeded, 2);
    assert_eq!(report.result.images_failed, 2);
    assert_eq!(report.result.failed.len(), 1);
    assert_eq!(report.result.failed[0].external_id, "p-2");
    assert!(report.result.failed[0].reason.contains("duplicate handle"));
}

#[tokio::test]
async fn markup_sets_price_and_keeps_cost() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "10.01")]), 1).await;

    let client = test_client(&server);
    let store = MemoryStore::default();
    let mut options = ImportOptions::new(2);
    options.markup_percent = dec("25");

    let report = run_import(&client, &store, &options).await;

    assert!(report.is_complete());
    let draft = store.draft("p-1");
    assert_eq!(draft.cost, dec("10.01"));
    assert_eq!(draft.price, dec("12.51"));
    assert_eq!(draft.name, "Product p-1");
    assert_eq!(draft.description, "Listing remark");
}

#[tokio::test]
async fn concurrent_records_keep_failures_in_listing_order() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(
        &server,
        1,
        page(vec![
            product("p-1", "bad"),
            product("p-2", "2.00"),
            product("p-3", ""),
            product("p-4", "4.00"),
        ]),
        1,
    )
    .await;

    let client = test_client(&server);
    let store = MemoryStore::default();
    let mut options = ImportOptions::new(5);
    options.record_concurrency = 4;

    let report = run_import(&client, &store, &options).await;

    assert_eq!(report.result.succeeded, 2);
    let failed: Vec<&str> = report
        .result
        .failed
        .iter()
        .map(|f| f.external_id.as_str())
        .collect();
    assert_eq!(failed, ["p-1", "p-3"]);
}

// ---------------------------------------------------------------------------
// Detail enrichment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detail_records_replace_listing_and_missing_details_are_skipped() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;

    let mut detail = product("p-1", "1.50");
    detail["description"] = json!("<div>Full <b>detail</b> text</div>");
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .and(query_param("pid", "p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(detail)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .and(query_param("pid", "p-2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let store = MemoryStore::default();
    let mut options = ImportOptions::new(2);
    options.max_pages = Some(1);
    options.fetch_details = true;

    let report = run_import(&client, &store, &options).await;

    assert!(report.is_complete(), "unexpected outcome: {report:?}");
    assert_eq!(report.result.succeeded, 1);
    assert_eq!(report.result.failed.len(), 1);
    assert_eq!(report.result.failed[0].external_id, "p-2");

    let draft = store.draft("p-1");
    assert_eq!(draft.description, "Full detail text");
    assert_eq!(draft.cost, dec("1.50"));
}

#[tokio::test]
async fn detail_fetch_server_error_is_fatal() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_page(&server, 1, page(vec![product("p-1", "1.00"), product("p-2", "2.00")]), 1).await;
    mount_page(&server, 2, page(vec![]), 0).await;

    Mock::given(method("GET"))
        .and(path("/product/query"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let store = MemoryStore::default();
    let mut options = ImportOptions::new(2);
    options.fetch_details = true;

    let report = run_import(&client, &store, &options).await;

    assert!(matches!(
        report.fatal,
        Some(SupplierError::Http { status: 503, .. })
    ));
    assert_eq!(report.result.processed(), 0);
}
