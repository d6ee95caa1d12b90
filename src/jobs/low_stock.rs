use super::{JobKind, LineFormat, ScheduledJob};
use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;

pub const RESTOCK_MUTATION: &str =
    "mutation { updateLowStockProducts { message updatedProducts { id name stock } } }";

#[derive(Debug, Deserialize)]
struct RestockResponse {
    #[serde(rename = "updateLowStockProducts")]
    payload: RestockPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    updated_products: Vec<RestockedProduct>,
}

#[derive(Debug, Deserialize)]
struct RestockedProduct {
    name: String,
    stock: i64,
}

/// 呼叫 `updateLowStockProducts` 並記錄每個補貨後的商品
#[derive(Debug, Clone, Copy, Default)]
pub struct LowStockJob;

#[async_trait]
impl ScheduledJob for LowStockJob {
    fn kind(&self) -> JobKind {
        JobKind::LowStock
    }

    fn line_format(&self) -> LineFormat {
        LineFormat::CRON
    }

    async fn execute(
        &self,
        transport: &dyn GraphqlTransport,
        _now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let data = transport.execute(RESTOCK_MUTATION, None).await?;
        let response: RestockResponse = serde_json::from_value(data)?;

        let mut lines = Vec::with_capacity(response.payload.updated_products.len() + 1);
        if let Some(message) = response.payload.message {
            lines.push(message);
        }
        lines.extend(
            response
                .payload
                .updated_products
                .into_iter()
                .map(|p| format!("Updated {} → stock: {}", p.name, p.stock)),
        );
        Ok(lines)
    }

    fn failure_message(&self, error: &CrmError) -> String {
        format!("Error updating stock: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_sink::MemorySink;
    use crate::jobs::run_at;
    use crate::jobs::test_support::{at, StaticTransport};

    #[tokio::test]
    async fn test_logs_message_and_each_product() {
        let transport = StaticTransport::ok(serde_json::json!({
            "updateLowStockProducts": {
                "message": "Low stock products successfully updated.",
                "updatedProducts": [
                    {"id": "1", "name": "Mouse", "stock": 13},
                    {"id": "2", "name": "Cable", "stock": 10}
                ]
            }
        }));
        let sink = MemorySink::new();

        run_at(&LowStockJob, &transport, &sink, at("2025-06-10 00:00:00")).await;

        assert_eq!(
            sink.lines().await,
            vec![
                "10/06/2025-00:00:00 Low stock products successfully updated.",
                "10/06/2025-00:00:00 Updated Mouse → stock: 13",
                "10/06/2025-00:00:00 Updated Cable → stock: 10",
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_logged_as_failure() {
        let transport = StaticTransport::ok(serde_json::json!({"somethingElse": true}));
        let sink = MemorySink::new();

        let report = run_at(&LowStockJob, &transport, &sink, at("2025-06-10 00:00:00")).await;

        assert!(!report.is_success());
        let lines = sink.lines().await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("10/06/2025-00:00:00 Error updating stock: "));
    }
}
