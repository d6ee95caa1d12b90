use super::{run_now, JobKind, ScheduledJob};
use crate::adapters::log_sink::FileSink;
use crate::config::toml_config::CrmConfig;
use crate::domain::ports::{GraphqlTransport, LogSink};
use crate::utils::error::{CrmError, Result};
use chrono::Local;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct ScheduledEntry {
    job: Arc<dyn ScheduledJob>,
    schedule: cron::Schedule,
    sink: Arc<dyn LogSink>,
}

/// 依 cron 排程在背景執行已註冊的工作
///
/// 每個工作各自一個 task；同一個工作的下一次執行會等上一次結束後才計算。
pub struct JobScheduler {
    transport: Arc<dyn GraphqlTransport>,
    entries: Vec<ScheduledEntry>,
}

impl JobScheduler {
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self {
            transport,
            entries: Vec::new(),
        }
    }

    /// 依設定註冊所有啟用且有排程的工作；排程無效的工作只記錄錯誤並略過
    pub fn from_config(config: &CrmConfig, transport: Arc<dyn GraphqlTransport>) -> Self {
        let mut scheduler = Self::new(transport);

        for kind in JobKind::ALL {
            let settings = config.job_settings(kind);
            if !settings.enabled {
                tracing::info!("Job {} disabled", kind);
                continue;
            }
            let Some(expr) = settings.schedule else {
                tracing::info!("Job {} has no schedule, run it with crm-job", kind);
                continue;
            };

            let sink: Arc<dyn LogSink> = Arc::new(FileSink::new(&settings.log_file));
            if let Err(e) = scheduler.register(kind.job(), &expr, sink) {
                tracing::error!("❌ {}", e);
            }
        }

        scheduler
    }

    pub fn register(
        &mut self,
        job: Arc<dyn ScheduledJob>,
        expr: &str,
        sink: Arc<dyn LogSink>,
    ) -> Result<()> {
        let schedule =
            cron::Schedule::from_str(expr).map_err(|e| CrmError::InvalidConfigValueError {
                field: format!("jobs.{}.schedule", job.kind().config_key()),
                value: expr.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Registered job {} with schedule '{}'", job.kind(), expr);
        self.entries.push(ScheduledEntry {
            job,
            schedule,
            sink,
        });
        Ok(())
    }

    pub fn jobs(&self) -> Vec<JobKind> {
        self.entries.iter().map(|e| e.job.kind()).collect()
    }

    /// 啟動所有工作；`cancel` 觸發後各 task 在目前的執行結束後停止
    pub fn start(self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|entry| {
                let transport = Arc::clone(&self.transport);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let kind = entry.job.kind();
                    tracing::info!("⏰ Scheduled job {} started", kind);
                    run_cron(entry, transport, cancel).await;
                    tracing::info!("Scheduled job {} stopped", kind);
                })
            })
            .collect()
    }
}

async fn run_cron(
    entry: ScheduledEntry,
    transport: Arc<dyn GraphqlTransport>,
    cancel: CancellationToken,
) {
    let kind = entry.job.kind();

    loop {
        let now = Local::now();
        let Some(next) = entry.schedule.upcoming(Local).next() else {
            tracing::warn!("No more upcoming runs for job {}", kind);
            break;
        };

        let until = (next - now).to_std().unwrap_or(Duration::from_secs(1));
        tracing::debug!("Job {} next run at {}", kind, next);

        tokio::select! {
            _ = tokio::time::sleep(until) => {
                run_now(entry.job.as_ref(), transport.as_ref(), entry.sink.as_ref()).await;
            }
            _ = cancel.cancelled() => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_sink::MemorySink;
    use crate::jobs::test_support::StaticTransport;
    use crate::jobs::HeartbeatJob;

    fn transport() -> Arc<dyn GraphqlTransport> {
        Arc::new(StaticTransport::ok(serde_json::json!({"hello": "Hello, GraphQL!"})))
    }

    #[test]
    fn test_register_rejects_invalid_cron() {
        let mut scheduler = JobScheduler::new(transport());
        let err = scheduler
            .register(Arc::new(HeartbeatJob), "every five minutes", Arc::new(MemorySink::new()))
            .unwrap_err();

        assert!(err.to_string().contains("jobs.heartbeat.schedule"));
        assert!(scheduler.jobs().is_empty());
    }

    #[test]
    fn test_from_config_skips_unscheduled_and_disabled() {
        let config = CrmConfig::from_toml_str(
            r#"
[jobs.low_stock]
enabled = false

[jobs.report]
schedule = "not a cron"
"#,
        )
        .unwrap();

        let scheduler = JobScheduler::from_config(&config, transport());

        assert_eq!(scheduler.jobs(), vec![JobKind::Heartbeat]);
    }

    #[tokio::test]
    async fn test_every_second_schedule_runs_until_cancelled() {
        let sink = Arc::new(MemorySink::new());
        let mut scheduler = JobScheduler::new(transport());
        scheduler
            .register(Arc::new(HeartbeatJob), "* * * * * *", sink.clone())
            .unwrap();

        let cancel = CancellationToken::new();
        let handles = scheduler.start(cancel.clone());

        tokio::time::sleep(Duration::from_millis(2200)).await;
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        let lines = sink.lines().await;
        assert!(lines.len() >= 2, "{:?}", lines);
        assert!(lines[0].ends_with("CRM is alive"));
    }
}
