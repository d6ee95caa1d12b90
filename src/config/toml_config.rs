use crate::adapters::http_transport::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECONDS};
use crate::core::RestockPolicy;
use crate::jobs::JobKind;
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_socket_addr, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/graphql";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub low_stock_threshold: Option<u32>,
    pub restock_increment: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<String>, // "compact" 或 "json"
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    pub heartbeat: Option<JobConfig>,
    pub low_stock: Option<JobConfig>,
    pub order_reminders: Option<JobConfig>,
    pub report: Option<JobConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    pub enabled: Option<bool>,
    pub schedule: Option<String>,
    pub log_file: Option<String>,
}

/// 合併預設值後的單一工作設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub enabled: bool,
    pub schedule: Option<String>,
    pub log_file: String,
}

impl CrmConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CrmError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CrmError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CRM_ENDPOINT})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
        });

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn bind_address(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn graphql_endpoint(&self) -> &str {
        self.client.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn retry_attempts(&self) -> u32 {
        self.client.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    pub fn restock_policy(&self) -> RestockPolicy {
        let defaults = RestockPolicy::default();
        RestockPolicy {
            threshold: self.inventory.low_stock_threshold.unwrap_or(defaults.threshold),
            increment: self.inventory.restock_increment.unwrap_or(defaults.increment),
        }
    }

    pub fn json_logging(&self) -> bool {
        self.logging.format.as_deref() == Some("json")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    fn job_config(&self, kind: JobKind) -> Option<&JobConfig> {
        match kind {
            JobKind::Heartbeat => self.jobs.heartbeat.as_ref(),
            JobKind::LowStock => self.jobs.low_stock.as_ref(),
            JobKind::OrderReminders => self.jobs.order_reminders.as_ref(),
            JobKind::Report => self.jobs.report.as_ref(),
        }
    }

    /// 空字串的 schedule 代表只能手動觸發
    pub fn job_settings(&self, kind: JobKind) -> JobSettings {
        let config = self.job_config(kind);

        let schedule = match config.and_then(|c| c.schedule.as_deref()) {
            Some(expr) if expr.trim().is_empty() => None,
            Some(expr) => Some(expr.to_string()),
            None => kind.default_schedule().map(str::to_string),
        };

        JobSettings {
            enabled: config.and_then(|c| c.enabled).unwrap_or(true),
            schedule,
            log_file: config
                .and_then(|c| c.log_file.clone())
                .unwrap_or_else(|| kind.default_log_file().to_string()),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_socket_addr("server.bind", self.bind_address())?;
        validate_url("client.endpoint", self.graphql_endpoint())?;

        if let Some(timeout) = self.client.timeout_seconds {
            validate_positive_number("client.timeout_seconds", timeout, 1)?;
        }
        validate_range("client.retry_attempts", self.retry_attempts(), 0, 10)?;

        let policy = self.restock_policy();
        validate_positive_number("inventory.restock_increment", u64::from(policy.increment), 1)?;

        if let Some(format) = self.logging.format.as_deref() {
            let valid_formats = ["compact", "json"];
            if !valid_formats.contains(&format) {
                return Err(CrmError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        for kind in JobKind::ALL {
            let settings = self.job_settings(kind);
            let prefix = format!("jobs.{}", kind.config_key());

            validate_path(&format!("{}.log_file", prefix), &settings.log_file)?;

            if let Some(expr) = &settings.schedule {
                cron::Schedule::from_str(expr).map_err(|e| CrmError::ConfigValidationError {
                    field: format!("{}.schedule", prefix),
                    message: format!("Invalid cron expression '{}': {}", expr, e),
                })?;
            }
        }

        Ok(())
    }
}

impl Validate for CrmConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CrmConfig::from_toml_str("").unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.graphql_endpoint(), "http://localhost:8000/graphql");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_attempts(), 3);
        assert_eq!(config.restock_policy(), RestockPolicy::default());
        assert!(!config.json_logging());
        assert!(config.validate().is_ok());

        let heartbeat = config.job_settings(JobKind::Heartbeat);
        assert!(heartbeat.enabled);
        assert_eq!(heartbeat.schedule.as_deref(), Some("0 */5 * * * *"));
        assert_eq!(heartbeat.log_file, "/tmp/crm_heartbeat_log.txt");

        let reminders = config.job_settings(JobKind::OrderReminders);
        assert_eq!(reminders.schedule, None);
        assert_eq!(reminders.log_file, "/tmp/order_reminders_log.txt");
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:9000"

[client]
endpoint = "http://crm.internal:9000/graphql"
timeout_seconds = 10
retry_attempts = 1

[inventory]
low_stock_threshold = 20
restock_increment = 5

[logging]
format = "json"

[jobs.low_stock]
schedule = "0 30 */6 * * *"
log_file = "/var/log/crm/low_stock.txt"

[jobs.report]
enabled = false

[jobs.order_reminders]
schedule = "0 0 8 * * *"
"#;

        let config = CrmConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.graphql_endpoint(), "http://crm.internal:9000/graphql");
        assert_eq!(config.retry_attempts(), 1);
        assert_eq!(
            config.restock_policy(),
            RestockPolicy {
                threshold: 20,
                increment: 5
            }
        );
        assert!(config.json_logging());

        let low_stock = config.job_settings(JobKind::LowStock);
        assert_eq!(low_stock.schedule.as_deref(), Some("0 30 */6 * * *"));
        assert_eq!(low_stock.log_file, "/var/log/crm/low_stock.txt");
        assert!(!config.job_settings(JobKind::Report).enabled);
        assert_eq!(
            config.job_settings(JobKind::OrderReminders).schedule.as_deref(),
            Some("0 0 8 * * *")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_schedule_disables_timer() {
        let config = CrmConfig::from_toml_str(
            r#"
[jobs.heartbeat]
schedule = ""
"#,
        )
        .unwrap();

        assert_eq!(config.job_settings(JobKind::Heartbeat).schedule, None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SMALL_CRM_TEST_ENDPOINT", "https://crm.example.com/graphql");

        let config = CrmConfig::from_toml_str(
            r#"
[client]
endpoint = "${SMALL_CRM_TEST_ENDPOINT}"
"#,
        )
        .unwrap();
        assert_eq!(config.graphql_endpoint(), "https://crm.example.com/graphql");

        std::env::remove_var("SMALL_CRM_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = CrmConfig::from_toml_str(
            r#"
[client]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_schedule = CrmConfig::from_toml_str(
            r#"
[jobs.report]
schedule = "every monday"
"#,
        )
        .unwrap();
        let err = bad_schedule.validate().unwrap_err();
        assert!(err.to_string().contains("jobs.report.schedule"));

        let bad_increment = CrmConfig::from_toml_str(
            r#"
[inventory]
restock_increment = 0
"#,
        )
        .unwrap();
        assert!(bad_increment.validate().is_err());

        let bad_format = CrmConfig::from_toml_str(
            r#"
[logging]
format = "xml"
"#,
        )
        .unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = CrmConfig::from_toml_str("[server\nbind = 1").unwrap_err();
        assert!(matches!(err, CrmError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbind = \"127.0.0.1:8123\"\n")
            .unwrap();

        let config = CrmConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8123");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = CrmConfig::from_toml_str(include_str!("../../crm.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.job_settings(JobKind::OrderReminders).schedule, None);
    }
}
