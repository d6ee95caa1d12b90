//! 排程工作：每個工作透過 GraphQL transport 發出一份固定的查詢或 mutation，
//! 並把帶時間戳記的結果逐行寫進自己的 log sink。
//!
//! 工作本身不會回傳錯誤給排程器，所有失敗都只寫成一行 log。

pub mod heartbeat;
pub mod low_stock;
pub mod reminders;
pub mod report;
pub mod scheduler;

pub use heartbeat::HeartbeatJob;
pub use low_stock::LowStockJob;
pub use reminders::OrderRemindersJob;
pub use report::ReportJob;
pub use scheduler::JobScheduler;

use crate::domain::ports::{GraphqlTransport, LogSink};
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Heartbeat,
    LowStock,
    OrderReminders,
    Report,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Heartbeat,
        JobKind::LowStock,
        JobKind::OrderReminders,
        JobKind::Report,
    ];

    pub fn name(self) -> &'static str {
        match self {
            JobKind::Heartbeat => "heartbeat",
            JobKind::LowStock => "low-stock",
            JobKind::OrderReminders => "order-reminders",
            JobKind::Report => "report",
        }
    }

    /// 設定檔中 `[jobs.<key>]` 的 key
    pub fn config_key(self) -> &'static str {
        match self {
            JobKind::Heartbeat => "heartbeat",
            JobKind::LowStock => "low_stock",
            JobKind::OrderReminders => "order_reminders",
            JobKind::Report => "report",
        }
    }

    /// cron 表達式，第一欄是秒；order reminders 預設由外部觸發
    pub fn default_schedule(self) -> Option<&'static str> {
        match self {
            JobKind::Heartbeat => Some("0 */5 * * * *"),
            JobKind::LowStock => Some("0 0 */12 * * *"),
            JobKind::OrderReminders => None,
            JobKind::Report => Some("0 0 6 * * Mon"),
        }
    }

    pub fn default_log_file(self) -> &'static str {
        match self {
            JobKind::Heartbeat => "/tmp/crm_heartbeat_log.txt",
            JobKind::LowStock => "/tmp/low_stock_updates_log.txt",
            JobKind::OrderReminders => "/tmp/order_reminders_log.txt",
            JobKind::Report => "/tmp/crm_report_log.txt",
        }
    }

    pub fn job(self) -> Arc<dyn ScheduledJob> {
        match self {
            JobKind::Heartbeat => Arc::new(HeartbeatJob),
            JobKind::LowStock => Arc::new(LowStockJob),
            JobKind::OrderReminders => Arc::new(OrderRemindersJob::default()),
            JobKind::Report => Arc::new(ReportJob),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JobKind {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.config_key() == s)
            .ok_or_else(|| CrmError::ConfigError {
                message: format!(
                    "Unknown job '{}'. Available jobs: {}",
                    s,
                    JobKind::ALL.map(JobKind::name).join(", ")
                ),
            })
    }
}

/// 每行的格式：`<timestamp><separator><message>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    pub timestamp: &'static str,
    pub separator: &'static str,
}

impl LineFormat {
    /// `DD/MM/YYYY-HH:MM:SS message`
    pub const CRON: LineFormat = LineFormat {
        timestamp: "%d/%m/%Y-%H:%M:%S",
        separator: " ",
    };

    /// `YYYY-MM-DD HH:MM:SS - message`
    pub const ISO: LineFormat = LineFormat {
        timestamp: "%Y-%m-%d %H:%M:%S",
        separator: " - ",
    };

    pub fn line(&self, now: &NaiveDateTime, message: &str) -> String {
        format!("{}{}{}", now.format(self.timestamp), self.separator, message)
    }
}

#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn kind(&self) -> JobKind;

    fn line_format(&self) -> LineFormat;

    /// 在呼叫 transport 之前就寫入的行
    fn preamble(&self) -> Vec<String> {
        Vec::new()
    }

    /// 發出 GraphQL 請求並回傳要寫入的訊息（不含時間戳記）
    async fn execute(
        &self,
        transport: &dyn GraphqlTransport,
        now: NaiveDateTime,
    ) -> Result<Vec<String>>;

    fn failure_message(&self, error: &CrmError) -> String;
}

/// 一次執行寫出的所有行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub kind: JobKind,
    pub lines: Vec<String>,
    pub error: Option<String>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

async fn write_line(kind: JobKind, sink: &dyn LogSink, line: String, written: &mut Vec<String>) {
    if let Err(e) = sink.append_line(&line).await {
        tracing::error!("❌ {}: failed to write log line: {}", kind, e);
    }
    written.push(line);
}

pub async fn run_now(
    job: &dyn ScheduledJob,
    transport: &dyn GraphqlTransport,
    sink: &dyn LogSink,
) -> JobReport {
    run_at(job, transport, sink, Local::now().naive_local()).await
}

/// 以指定時間執行一次；同一次執行的每一行都使用相同的時間戳記
pub async fn run_at(
    job: &dyn ScheduledJob,
    transport: &dyn GraphqlTransport,
    sink: &dyn LogSink,
    now: NaiveDateTime,
) -> JobReport {
    let kind = job.kind();
    let format = job.line_format();
    let mut lines = Vec::new();

    tracing::debug!("Running job {}", kind);

    for message in job.preamble() {
        write_line(kind, sink, format.line(&now, &message), &mut lines).await;
    }

    match job.execute(transport, now).await {
        Ok(messages) => {
            for message in messages {
                write_line(kind, sink, format.line(&now, &message), &mut lines).await;
            }
            tracing::info!("✅ Job {} completed", kind);
            JobReport {
                kind,
                lines,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("❌ Job {} failed: {}", kind, e);
            write_line(kind, sink, format.line(&now, &job.failure_message(&e)), &mut lines).await;
            JobReport {
                kind,
                lines,
                error: Some(e.to_string()),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{at, StaticTransport};
    use super::*;
    use crate::adapters::log_sink::MemorySink;

    struct FailingSink;

    #[async_trait]
    impl LogSink for FailingSink {
        async fn append_line(&self, _line: &str) -> Result<()> {
            Err(CrmError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn test_job_kind_parsing() {
        assert_eq!("low-stock".parse::<JobKind>().unwrap(), JobKind::LowStock);
        assert_eq!("order_reminders".parse::<JobKind>().unwrap(), JobKind::OrderReminders);
        let err = "cleanup".parse::<JobKind>().unwrap_err();
        assert!(err.to_string().contains("heartbeat, low-stock, order-reminders, report"));
    }

    #[test]
    fn test_line_formats() {
        let now = at("2025-03-04 05:06:07");
        assert_eq!(LineFormat::CRON.line(&now, "CRM is alive"), "04/03/2025-05:06:07 CRM is alive");
        assert_eq!(LineFormat::ISO.line(&now, "Report"), "2025-03-04 05:06:07 - Report");
    }

    #[test]
    fn test_default_schedules_are_valid_cron() {
        for kind in JobKind::ALL {
            if let Some(expr) = kind.default_schedule() {
                assert!(expr.parse::<cron::Schedule>().is_ok(), "{}", expr);
            }
        }
    }

    #[tokio::test]
    async fn test_run_swallow_transport_failure() {
        let transport = StaticTransport::failing("connection refused");
        let sink = MemorySink::new();

        let report = run_at(&HeartbeatJob, &transport, &sink, at("2025-01-01 00:00:00")).await;

        assert!(!report.is_success());
        assert_eq!(
            sink.lines().await,
            vec![
                "01/01/2025-00:00:00 CRM is alive",
                "01/01/2025-00:00:00 Error querying GraphQL: GraphQL request returned errors: connection refused",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_survives_sink_failure() {
        let transport = StaticTransport::ok(serde_json::json!({"hello": "Hello, GraphQL!"}));

        let report = run_at(&HeartbeatJob, &transport, &FailingSink, at("2025-01-01 00:00:00")).await;

        assert!(report.is_success());
        assert_eq!(report.lines.len(), 2);
    }
}
