use super::{JobKind, LineFormat, ScheduledJob};
use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;

pub const HELLO_QUERY: &str = "query { hello }";

/// 先寫一行存活訊息，再確認 GraphQL 端點有回應
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatJob;

#[async_trait]
impl ScheduledJob for HeartbeatJob {
    fn kind(&self) -> JobKind {
        JobKind::Heartbeat
    }

    fn line_format(&self) -> LineFormat {
        LineFormat::CRON
    }

    fn preamble(&self) -> Vec<String> {
        vec!["CRM is alive".to_string()]
    }

    async fn execute(
        &self,
        transport: &dyn GraphqlTransport,
        _now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let data = transport.execute(HELLO_QUERY, None).await?;
        Ok(vec![format!("GraphQL hello response: {}", data)])
    }

    fn failure_message(&self, error: &CrmError) -> String {
        format!("Error querying GraphQL: {}", error)
    }
}
