//! End-to-end tests for the sync loop
//!
//! The remote API is a scripted fake; result files are served by mockito so
//! the real downloader, verifier, reconstructor and checkpoint store run.

use async_trait::async_trait;
use chrono::Utc;
use mockito::{Server, ServerGuard};
use serde_json::{json, Value};
use shopsync::adapters::shopify::BulkOperationApi;
use shopsync::adapters::storage::JsonFileCheckpointStore;
use shopsync::config::{secret_string, ShopSyncConfig, ShopifyConfig};
use shopsync::core::state::{CheckpointManager, CheckpointOutcome};
use shopsync::core::sync::{EntityStatus, SyncCoordinator};
use shopsync::core::transform::OutputFormat;
use shopsync::domain::{BulkJob, EntityKind, JobId, JobStatus, Result, SyncError};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::watch;

const ORDERS: &str = concat!(
    "{\"id\":\"gid://shopify/Order/1\",\"name\":\"#1001\",\"customer\":{\"email\":\"a@example.com\"},\"refunds\":[{\"id\":\"gid://shopify/Refund/1\",\"note\":\"damaged\"}]}\n",
    "{\"id\":\"gid://shopify/LineItem/1\",\"variant\":{\"sku\":\"HAT\"},\"__parentId\":\"gid://shopify/Order/1\"}\n",
    "{\"id\":\"gid://shopify/Order/2\",\"name\":\"#1002\"}\n",
    "{\"id\":\"gid://shopify/LineItem/9\",\"variant\":{},\"__parentId\":\"gid://shopify/Order/404\"}\n",
);

const PRODUCTS: &str = concat!(
    "{\"id\":\"P1\",\"title\":\"Hat\"}\n",
    "{\"id\":\"V1\",\"sku\":\"HAT-S\",\"__parentId\":\"P1\"}\n",
    "{\"id\":\"L1\",\"available\":3,\"__parentId\":\"V1\"}\n",
);

/// What the fake does with the next submission
enum Step {
    Complete { url: String, objects: u64 },
    Empty,
    Fail,
    Partial { url: String, objects: u64 },
    SubmitError(String),
}

struct FakeShop {
    steps: Mutex<VecDeque<Step>>,
    current: Mutex<Option<BulkJob>>,
    queries: Mutex<Vec<String>>,
    shutdown_after_first_submit: Mutex<Option<watch::Sender<bool>>>,
}

impl FakeShop {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            current: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
            shutdown_after_first_submit: Mutex::new(None),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkOperationApi for FakeShop {
    async fn submit(&self, query: &str) -> Result<JobId> {
        let attempt = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.to_string());
            queries.len()
        };
        if let Some(tx) = self.shutdown_after_first_submit.lock().unwrap().take() {
            tx.send(true).unwrap();
        }

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected submission");
        let id = JobId::new(format!("gid://shopify/BulkOperation/{attempt}")).unwrap();

        let job = match step {
            Step::SubmitError(message) => return Err(SyncError::Transport(message)),
            Step::Complete { url, objects } => BulkJob::new(id.clone(), JobStatus::Completed)
                .with_object_count(objects)
                .with_url(url),
            Step::Empty => BulkJob::new(id.clone(), JobStatus::Completed),
            Step::Fail => BulkJob::new(id.clone(), JobStatus::Failed)
                .with_error_code("INTERNAL_SERVER_ERROR"),
            Step::Partial { url, objects } => BulkJob::new(id.clone(), JobStatus::Failed)
                .with_error_code("INTERNAL_SERVER_ERROR")
                .with_object_count(objects)
                .with_partial_data_url(url),
        };
        *self.current.lock().unwrap() = Some(job);
        Ok(id)
    }

    async fn current_job(&self) -> Result<Option<BulkJob>> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn shop_info(&self) -> Result<Value> {
        Ok(json!({"id": "gid://shopify/Shop/1", "name": "Test Shop", "currencyCode": "USD"}))
    }
}

fn config(dir: &TempDir, entities: Vec<EntityKind>) -> ShopSyncConfig {
    let mut config = ShopSyncConfig {
        application: Default::default(),
        shopify: ShopifyConfig {
            shop_domain: "test-shop.myshopify.com".to_string(),
            access_token: Some(secret_string("shpat_test".to_string())),
            ..Default::default()
        },
        bulk: Default::default(),
        sync: Default::default(),
        state: Default::default(),
        upload: Default::default(),
        logging: Default::default(),
    };
    config.sync.entities = entities;
    config.sync.data_dir = dir.path().join("data");
    config.sync.retry_initial_delay_ms = 1;
    config.sync.retry_max_delay_ms = 5;
    config.state.path = dir.path().join("state/sync_state.json");
    config
}

fn coordinator(config: &ShopSyncConfig, api: Arc<FakeShop>) -> SyncCoordinator {
    let (_tx, rx) = watch::channel(false);
    coordinator_with_shutdown(config, api, rx)
}

fn coordinator_with_shutdown(
    config: &ShopSyncConfig,
    api: Arc<FakeShop>,
    shutdown: watch::Receiver<bool>,
) -> SyncCoordinator {
    let store = Arc::new(JsonFileCheckpointStore::new(config.state.path.clone()));
    SyncCoordinator::new(config.clone(), api, store, shutdown).unwrap()
}

fn checkpoints(config: &ShopSyncConfig) -> CheckpointManager {
    CheckpointManager::new(Arc::new(JsonFileCheckpointStore::new(
        config.state.path.clone(),
    )))
}

async fn serve(server: &mut ServerGuard, path: &str, body: &str) -> String {
    server
        .mock("GET", path)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    format!("{}{path}", server.url())
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

fn files_in(dir: PathBuf) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_full_cycle_writes_nested_output_and_checkpoint() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/orders.jsonl", ORDERS).await;
    let dir = TempDir::new().unwrap();
    let config = config(&dir, vec![EntityKind::Orders]);
    let api = FakeShop::new(vec![Step::Complete { url, objects: 4 }]);

    let summary = coordinator(&config, api.clone()).execute().await;

    assert!(summary.is_successful());
    let report = summary.report("orders").unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.job_id.as_deref(), Some("gid://shopify/BulkOperation/1"));

    // First run has no lower bound
    assert!(!api.queries()[0].contains("updated_at"));

    let output = read_json(report.output.as_ref().unwrap());
    let orders = output.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], "gid://shopify/Order/1");
    assert_eq!(orders[0]["lineItems"][0]["variant"]["sku"], "HAT");
    assert_eq!(orders[0]["refunds"][0]["id"], "gid://shopify/Refund/1");
    assert_eq!(orders[0]["refunds"][0]["note"], "damaged");
    assert_eq!(orders[1]["lineItems"], json!([]));
    assert_eq!(orders[1]["refunds"], json!([]));

    let raw = files_in(dir.path().join("data/raw/orders"));
    assert_eq!(raw.len(), 1);
    assert_eq!(std::fs::read_to_string(&raw[0]).unwrap(), ORDERS);

    let checkpoint = checkpoints(&config).get("orders").await.unwrap().unwrap();
    assert!(checkpoint.last_success.is_some());
    assert_eq!(checkpoint.records_count, 2);
    assert_eq!(checkpoint.dropped_records, 1);
    assert_eq!(checkpoint.file_size, ORDERS.len() as u64);
    assert!(checkpoint.artifact_sha256.is_some());
    assert!(checkpoint.error.is_none());
}

#[tokio::test]
async fn test_second_run_is_incremental() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/products.jsonl", PRODUCTS).await;
    let dir = TempDir::new().unwrap();
    let config = config(&dir, vec![EntityKind::Products]);

    let last_success = Utc::now() - chrono::Duration::hours(2);
    checkpoints(&config)
        .record_outcome("products", CheckpointOutcome::succeeded(last_success, 1))
        .await
        .unwrap();

    let api = FakeShop::new(vec![Step::Complete { url, objects: 3 }]);
    let summary = coordinator(&config, api.clone()).execute().await;

    assert!(summary.is_successful());
    let query = &api.queries()[0];
    assert!(query.contains("products(query: \"updated_at:>='"), "{query}");
    assert!(!query.contains("{INCREMENTAL_FILTER}"));

    let checkpoint = checkpoints(&config).get("products").await.unwrap().unwrap();
    assert!(checkpoint.last_success.unwrap() > last_success);
}

#[tokio::test]
async fn test_full_mode_ignores_checkpoint() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/products.jsonl", PRODUCTS).await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Products]);
    config.sync.mode = shopsync::config::SyncMode::Full;

    checkpoints(&config)
        .record_outcome("products", CheckpointOutcome::succeeded(Utc::now(), 1))
        .await
        .unwrap();

    let api = FakeShop::new(vec![Step::Complete { url, objects: 3 }]);
    coordinator(&config, api.clone()).execute().await;

    assert!(!api.queries()[0].contains("updated_at"));
}

#[tokio::test]
async fn test_failed_entity_keeps_last_success_and_does_not_stop_next() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/products.jsonl", PRODUCTS).await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Orders, EntityKind::Products]);
    config.sync.max_attempts = 1;

    let earlier = Utc::now() - chrono::Duration::days(1);
    checkpoints(&config)
        .record_outcome("orders", CheckpointOutcome::succeeded(earlier, 40))
        .await
        .unwrap();

    let api = FakeShop::new(vec![Step::Fail, Step::Complete { url, objects: 3 }]);
    let summary = coordinator(&config, api.clone()).execute().await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 1);
    let orders = summary.report("orders").unwrap();
    assert_eq!(orders.status, EntityStatus::Failed);
    assert_eq!(orders.error_kind, Some("remote_job"));

    let store = checkpoints(&config);
    let orders = store.get("orders").await.unwrap().unwrap();
    assert_eq!(orders.last_success, Some(earlier));
    assert_eq!(orders.records_count, 40);
    assert!(orders.error.as_deref().unwrap().contains("FAILED"));
    assert_eq!(orders.job_id.as_deref(), Some("gid://shopify/BulkOperation/1"));

    let products = store.get("products").await.unwrap().unwrap();
    assert!(products.error.is_none());
}

#[tokio::test]
async fn test_partial_result_is_kept_and_advances_checkpoint() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/partial.jsonl", PRODUCTS).await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Products]);
    config.sync.max_attempts = 3;

    let earlier = Utc::now() - chrono::Duration::days(1);
    checkpoints(&config)
        .record_outcome("products", CheckpointOutcome::succeeded(earlier, 12))
        .await
        .unwrap();

    let api = FakeShop::new(vec![Step::Partial { url, objects: 3 }]);
    let summary = coordinator(&config, api.clone()).execute().await;

    // A partial result is not retried
    assert!(summary.is_successful());
    assert_eq!(api.queries().len(), 1);
    let report = summary.report("products").unwrap();
    assert_eq!(report.status, EntityStatus::Succeeded);
    assert!(report.partial);
    assert_eq!(report.records, 1);
    assert_eq!(report.file_size, PRODUCTS.len() as u64);

    let raw = files_in(dir.path().join("data/raw/products"));
    assert_eq!(raw.len(), 1);
    assert_eq!(std::fs::read_to_string(&raw[0]).unwrap(), PRODUCTS);

    let output = read_json(report.output.as_ref().unwrap());
    assert_eq!(output[0]["variants"][0]["sku"], "HAT-S");

    let checkpoint = checkpoints(&config).get("products").await.unwrap().unwrap();
    assert!(checkpoint.partial);
    assert!(checkpoint.last_success.unwrap() > earlier);
    assert_eq!(checkpoint.records_count, 1);
    assert!(checkpoint.error.is_none());
    assert_eq!(checkpoint.job_id.as_deref(), Some("gid://shopify/BulkOperation/1"));
}

#[tokio::test]
async fn test_retryable_failure_is_retried() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/products.jsonl", PRODUCTS).await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Products]);
    config.sync.max_attempts = 3;

    let api = FakeShop::new(vec![
        Step::SubmitError("connection reset".to_string()),
        Step::Fail,
        Step::Complete { url, objects: 3 },
    ]);
    let summary = coordinator(&config, api.clone()).execute().await;

    assert!(summary.is_successful());
    assert_eq!(api.queries().len(), 3);
    assert_eq!(summary.report("products").unwrap().records, 1);
}

#[tokio::test]
async fn test_verification_failure_is_not_retried() {
    let mut server = Server::new_async().await;
    let url = serve(
        &mut server,
        "/products.jsonl",
        "{\"id\":\"P1\"}\n{\"id\":\"V1\",\"__par",
    )
    .await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Products]);
    config.sync.max_attempts = 3;

    let api = FakeShop::new(vec![Step::Complete { url, objects: 2 }]);
    let summary = coordinator(&config, api.clone()).execute().await;

    assert_eq!(api.queries().len(), 1);
    let report = summary.report("products").unwrap();
    assert_eq!(report.error_kind, Some("verification"));
    assert!(files_in(dir.path().join("data/processed/products")).is_empty());

    let checkpoint = checkpoints(&config).get("products").await.unwrap().unwrap();
    assert!(checkpoint.last_success.is_none());
    assert!(checkpoint.is_failed());
}

#[tokio::test]
async fn test_empty_export_succeeds_without_download() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, vec![EntityKind::Collections]);
    let api = FakeShop::new(vec![Step::Empty]);

    let summary = coordinator(&config, api).execute().await;

    assert!(summary.is_successful());
    let report = summary.report("collections").unwrap();
    assert_eq!(report.records, 0);
    assert_eq!(read_json(report.output.as_ref().unwrap()), json!([]));
    assert!(files_in(dir.path().join("data/raw/collections")).is_empty());

    let checkpoint = checkpoints(&config).get("collections").await.unwrap().unwrap();
    assert!(checkpoint.last_success.is_some());
    assert_eq!(checkpoint.file_size, 0);
}

#[tokio::test]
async fn test_flatten_and_upload() {
    let mut server = Server::new_async().await;
    let url = serve(&mut server, "/orders.jsonl", ORDERS).await;
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Orders]);
    config.sync.output_format = OutputFormat::Flatten;
    config.upload.enabled = true;
    config.upload.target_dir = Some(dir.path().join("bucket"));
    config.upload.prefix = "shopify".to_string();

    let api = FakeShop::new(vec![Step::Complete { url, objects: 4 }]);
    let summary = coordinator(&config, api).execute().await;

    let report = summary.report("orders").unwrap();
    assert!(report.is_success());
    let uploaded = PathBuf::from(report.uploaded_to.as_ref().unwrap());
    assert!(uploaded.starts_with(dir.path().join("bucket/shopify/orders")));

    let output = read_json(&uploaded);
    assert_eq!(output[0]["customer_email"], "a@example.com");
    assert!(output[0]["processed_at"].is_string());
    assert_eq!(output[0]["lineItems"][0]["variant_sku"], "HAT");
    assert!(output[0]["lineItems"][0].get("__parentId").is_none());
}

#[tokio::test]
async fn test_shop_info_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, vec![EntityKind::Collections]);
    config.sync.include_shop_info = true;
    let api = FakeShop::new(vec![Step::Empty]);

    let summary = coordinator(&config, api).execute().await;

    assert!(summary.is_successful());
    let report = summary.report("shop_info").unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(read_json(report.output.as_ref().unwrap())["name"], "Test Shop");

    let checkpoint = checkpoints(&config).get("shop_info").await.unwrap().unwrap();
    assert_eq!(checkpoint.records_count, 1);
}

#[tokio::test]
async fn test_shutdown_skips_remaining_entities() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, vec![EntityKind::Collections, EntityKind::Customers]);
    let api = FakeShop::new(vec![Step::Empty]);

    let (tx, rx) = watch::channel(false);
    *api.shutdown_after_first_submit.lock().unwrap() = Some(tx);

    let summary = coordinator_with_shutdown(&config, api.clone(), rx)
        .execute()
        .await;

    // The entity in flight finishes; the next one is not started
    assert_eq!(summary.report("collections").unwrap().status, EntityStatus::Succeeded);
    assert_eq!(summary.report("customers").unwrap().status, EntityStatus::Interrupted);
    assert_eq!(api.queries().len(), 1);
    assert!(checkpoints(&config).get("customers").await.unwrap().is_none());
}
