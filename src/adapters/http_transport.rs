use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// 透過 HTTP POST 呼叫 GraphQL API 的客戶端
///
/// 連線失敗、逾時或 5xx 會立即重試，最多 `retry_attempts` 次，不做 backoff。
#[derive(Debug, Clone)]
pub struct HttpGraphqlClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
    retry_attempts: u32,
}

impl HttpGraphqlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("GraphQL response status: {}", status);
        if !status.is_success() {
            return Err(CrmError::HttpStatusError {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

fn is_retryable(error: &CrmError) -> bool {
    match error {
        CrmError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        CrmError::HttpStatusError { status } => *status >= 500,
        _ => false,
    }
}

/// 取出 `data`；`errors` 不為空時視為失敗
pub fn parse_graphql_response(mut body: Value) -> Result<Value> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CrmError::GraphqlError { message });
        }
    }

    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(CrmError::UnexpectedResponse {
            message: "GraphQL response has no data".to_string(),
        }),
    }
}

#[async_trait]
impl GraphqlTransport for HttpGraphqlClient {
    async fn execute(&self, document: &str, variables: Option<Value>) -> Result<Value> {
        let body = json!({
            "query": document,
            "variables": variables,
        });

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(response) => return parse_graphql_response(response),
                Err(e) if attempt < self.retry_attempts && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ GraphQL request to {} failed ({}), retry {}/{}",
                        self.endpoint,
                        e,
                        attempt,
                        self.retry_attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
