use super::{JobKind, LineFormat, ScheduledJob};
use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

pub const REPORT_QUERY: &str = "query { customersCount ordersCount totalRevenue }";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    #[serde(default)]
    customers_count: u64,
    #[serde(default)]
    orders_count: u64,
    // Decimal scalar 會以字串回傳，其他伺服器可能回傳數字
    #[serde(default)]
    total_revenue: Value,
}

fn revenue_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// 每週彙總：客戶數、訂單數與總營收
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportJob;

#[async_trait]
impl ScheduledJob for ReportJob {
    fn kind(&self) -> JobKind {
        JobKind::Report
    }

    fn line_format(&self) -> LineFormat {
        LineFormat::ISO
    }

    async fn execute(
        &self,
        transport: &dyn GraphqlTransport,
        _now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let data = transport.execute(REPORT_QUERY, None).await?;
        let report: ReportResponse = serde_json::from_value(data)?;

        Ok(vec![format!(
            "Report: {} customers, {} orders, {} revenue",
            report.customers_count,
            report.orders_count,
            revenue_text(&report.total_revenue)
        )])
    }

    fn failure_message(&self, error: &CrmError) -> String {
        format!("Error generating report: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_sink::MemorySink;
    use crate::jobs::run_at;
    use crate::jobs::test_support::{at, StaticTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_report_line() {
        let transport = StaticTransport::ok(json!({
            "customersCount": 3,
            "ordersCount": 5,
            "totalRevenue": "1234.50"
        }));
        let sink = MemorySink::new();

        run_at(&ReportJob, &transport, &sink, at("2025-06-09 06:00:00")).await;

        assert_eq!(
            sink.lines().await,
            vec!["2025-06-09 06:00:00 - Report: 3 customers, 5 orders, 1234.50 revenue"]
        );
    }

    #[test]
    fn test_revenue_accepts_numbers_and_missing() {
        assert_eq!(revenue_text(&json!(99.5)), "99.5");
        assert_eq!(revenue_text(&json!(0)), "0");
        assert_eq!(revenue_text(&Value::Null), "0");
    }

    #[tokio::test]
    async fn test_report_failure() {
        let transport = StaticTransport::failing("store offline");
        let sink = MemorySink::new();

        run_at(&ReportJob, &transport, &sink, at("2025-06-09 06:00:00")).await;

        assert_eq!(
            sink.lines().await,
            vec!["2025-06-09 06:00:00 - Error generating report: GraphQL request returned errors: store offline"]
        );
    }
}
