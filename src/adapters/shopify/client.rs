//! Admin API GraphQL client
//!
//! [`ShopifyClient`] implements [`BulkOperationApi`] over reqwest. Every
//! request carries the `X-Shopify-Access-Token` header. Transport failures
//! (connect errors, timeouts, HTTP 429 and 5xx) are retried with exponential
//! backoff; everything else is classified and returned immediately.

use super::api::BulkOperationApi;
use super::models::{
    CurrentOperationData, GraphQlRequest, GraphQlResponse, RunQueryData, ShopData,
};
use super::queries::{CURRENT_BULK_OPERATION_QUERY, RUN_BULK_QUERY_MUTATION, SHOP_INFO_QUERY};
use crate::config::{RetryConfig, SecretString, ShopifyConfig};
use crate::domain::ids::JobId;
use crate::domain::{BulkJob, Result, SyncError};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// GraphQL client for one shop
///
/// # Example
///
/// ```no_run
/// use shopsync::adapters::shopify::{BulkOperationApi, ShopifyClient};
/// use shopsync::config::{secret_string, ShopifyConfig};
///
/// # async fn example() -> shopsync::domain::Result<()> {
/// let config = ShopifyConfig {
///     shop_domain: "my-store.myshopify.com".to_string(),
///     access_token: Some(secret_string("shpat_...".to_string())),
///     ..ShopifyConfig::default()
/// };
/// let client = ShopifyClient::new(&config)?;
/// if let Some(job) = client.current_job().await? {
///     println!("{} is {}", job.id, job.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ShopifyClient {
    endpoint: String,
    client: Client,
    access_token: SecretString,
    retry: RetryConfig,
}

impl ShopifyClient {
    /// Create a client from the `[shopify]` configuration section
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if no access token is configured
    /// or the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self> {
        let access_token = config.access_token.clone().ok_or_else(|| {
            SyncError::Configuration("shopify.access_token is not configured".to_string())
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("shopsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SyncError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint: config.graphql_endpoint(),
            client,
            access_token,
            retry: config.retry.clone(),
        })
    }

    /// GraphQL endpoint this client posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a GraphQL document and return its `data` member
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let body = GraphQlRequest { query, variables };

        let response: GraphQlResponse<T> = self.retry_request(|| self.send_once(&body)).await?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| match e.code() {
                    Some(code) => format!("{} ({code})", e.message),
                    None => e.message.clone(),
                })
                .collect();
            return Err(SyncError::Api(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }

        response
            .data
            .ok_or_else(|| SyncError::Api("GraphQL response has no data".to_string()))
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        body: &GraphQlRequest<'_>,
    ) -> Result<GraphQlResponse<T>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.access_token.expose_secret().as_ref())
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        resp.json::<GraphQlResponse<T>>()
            .await
            .map_err(|e| SyncError::Api(format!("Unexpected GraphQL response shape: {e}")))
    }

    /// Retry a request with exponential backoff
    ///
    /// Only [`SyncError::Transport`] is retried; the delay before retry `n` is
    /// `initial_delay_ms * multiplier^(n-1)`, capped, plus up to 10% jitter.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e @ SyncError::Transport(_)) if attempt < max_retries => {
                    attempt += 1;
                    let base = self.retry.delay_for_attempt(attempt);
                    let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 10);
                    let delay = base + Duration::from_millis(jitter_ms);

                    crate::log_retry_attempt!(attempt, max_retries, delay.as_millis() as u64, e);

                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a non-success HTTP status to an error kind
fn classify_status(status: StatusCode, body: &str) -> SyncError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", truncate(body, 512))
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::Authentication(format!("Admin API rejected credentials ({detail})"))
        }
        StatusCode::TOO_MANY_REQUESTS => SyncError::Transport(format!("Throttled ({detail})")),
        s if s.is_server_error() => SyncError::Transport(format!("Server error ({detail})")),
        _ => SyncError::Api(format!("Request rejected ({detail})")),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl BulkOperationApi for ShopifyClient {
    async fn submit(&self, query: &str) -> Result<JobId> {
        let data: RunQueryData = self
            .execute(RUN_BULK_QUERY_MUTATION, json!({ "query": query }))
            .await?;

        let payload = data.run.ok_or_else(|| {
            SyncError::Api("bulkOperationRunQuery returned no payload".to_string())
        })?;

        if !payload.user_errors.is_empty() {
            let messages: Vec<String> = payload.user_errors.iter().map(|e| e.to_string()).collect();
            return Err(SyncError::UserInput(messages.join("; ")));
        }

        let operation = payload.bulk_operation.ok_or_else(|| {
            SyncError::Api("bulkOperationRunQuery returned neither a job nor errors".to_string())
        })?;

        tracing::debug!(job_id = %operation.id, status = %operation.status, "Bulk operation accepted");
        JobId::new(operation.id).map_err(SyncError::Api)
    }

    async fn current_job(&self) -> Result<Option<BulkJob>> {
        let data: CurrentOperationData = self
            .execute(CURRENT_BULK_OPERATION_QUERY, json!({}))
            .await?;
        data.current.map(|node| node.into_domain()).transpose()
    }

    async fn shop_info(&self) -> Result<Value> {
        let data: ShopData = self.execute(SHOP_INFO_QUERY, json!({})).await?;
        data.shop
            .ok_or_else(|| SyncError::Api("shop query returned no shop".to_string()))
    }
}
