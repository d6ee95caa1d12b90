use crate::config::toml_config::CrmConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "small-crm")]
#[command(about = "CRM GraphQL API with scheduled maintenance jobs")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "crm.toml")]
    pub config: String,

    /// Override server.bind from config
    #[arg(long)]
    pub bind: Option<String>,

    /// Serve the API without starting scheduled jobs
    #[arg(long)]
    pub no_scheduler: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 設定檔不存在時使用預設值，再套用命令列覆蓋
    pub fn load(&self) -> Result<CrmConfig> {
        let mut config = load_config_file(&self.config)?;

        if let Some(bind) = &self.bind {
            config.server.bind = Some(bind.clone());
        }

        Ok(config)
    }
}

pub fn load_config_file(path: &str) -> Result<CrmConfig> {
    if Path::new(path).exists() {
        CrmConfig::from_file(path)
    } else {
        tracing::debug!("Config file '{}' not found, using defaults", path);
        Ok(CrmConfig::default())
    }
}
