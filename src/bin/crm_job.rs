use clap::Parser;
use small_crm::config::cli::load_config_file;
use small_crm::utils::{logger, validation::Validate};
use small_crm::{run_now, FileSink, HttpGraphqlClient, JobKind};

#[derive(Parser)]
#[command(name = "crm-job")]
#[command(about = "Run one CRM maintenance job immediately")]
struct Args {
    /// heartbeat, low-stock, order-reminders or report
    job: JobKind,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "crm.toml")]
    config: String,

    /// Write the job log here instead of the configured file
    #[arg(long)]
    log_file: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            std::process::exit(e.exit_code());
        }
    };

    if config.json_logging() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let settings = config.job_settings(args.job);
    let log_file = args.log_file.unwrap_or(settings.log_file);
    tracing::info!("🚀 Running {} (log: {})", args.job, log_file);

    let transport = HttpGraphqlClient::new(config.graphql_endpoint())
        .with_timeout(config.request_timeout())
        .with_retry_attempts(config.retry_attempts());
    let sink = FileSink::new(log_file);
    let job = args.job.job();

    // 失敗已寫入 job log，結束碼維持 0
    let report = run_now(job.as_ref(), &transport, &sink).await;
    if report.is_success() {
        eprintln!("{} processed!", args.job);
    } else {
        eprintln!("{} failed!", args.job);
    }
}
