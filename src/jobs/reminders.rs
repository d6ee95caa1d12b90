use super::{JobKind, LineFormat, ScheduledJob};
use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

pub const RECENT_ORDERS_QUERY: &str = "query RecentOrders($startDate: NaiveDate!) { \
     allOrders(orderDateGte: $startDate) { id customer { email } } }";

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct RecentOrdersResponse {
    #[serde(rename = "allOrders")]
    orders: Vec<RecentOrder>,
}

#[derive(Debug, Deserialize)]
struct RecentOrder {
    id: String,
    customer: Option<OrderCustomer>,
}

#[derive(Debug, Deserialize)]
struct OrderCustomer {
    email: String,
}

/// 列出最近 `window_days` 天內的訂單與客戶 email
#[derive(Debug, Clone, Copy)]
pub struct OrderRemindersJob {
    window_days: i64,
}

impl OrderRemindersJob {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }
}

impl Default for OrderRemindersJob {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

#[async_trait]
impl ScheduledJob for OrderRemindersJob {
    fn kind(&self) -> JobKind {
        JobKind::OrderReminders
    }

    fn line_format(&self) -> LineFormat {
        LineFormat::ISO
    }

    async fn execute(
        &self,
        transport: &dyn GraphqlTransport,
        now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        // 以日期比較，包含起始當天
        let start_date = now.date() - Duration::days(self.window_days);
        let variables = json!({ "startDate": start_date.to_string() });

        let data = transport.execute(RECENT_ORDERS_QUERY, Some(variables)).await?;
        let response: RecentOrdersResponse = serde_json::from_value(data)?;

        if response.orders.is_empty() {
            return Ok(vec!["No recent orders found.".to_string()]);
        }

        Ok(response
            .orders
            .into_iter()
            .map(|order| {
                let email = order
                    .customer
                    .map(|c| c.email)
                    .unwrap_or_else(|| "unknown".to_string());
                format!("Order ID: {}, Customer Email: {}", order.id, email)
            })
            .collect())
    }

    fn failure_message(&self, error: &CrmError) -> String {
        format!("Error processing order reminders: {}", error)
    }
}
