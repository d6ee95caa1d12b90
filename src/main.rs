use clap::Parser;
use small_crm::domain::ports::GraphqlTransport;
use small_crm::utils::{logger, validation::Validate};
use small_crm::{
    build_schema, CliConfig, CrmConfig, CrmError, CrmService, HttpGraphqlClient, JobScheduler,
    MemoryStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn init_logging(config: &CrmConfig, verbose: bool) {
    if config.json_logging() {
        logger::init_json_logger(verbose, config.log_level());
    } else {
        logger::init_cli_logger(verbose, config.log_level());
    }
}

fn exit_with(e: &CrmError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };

    // 初始化日誌
    init_logging(&config, cli.verbose);
    tracing::info!("Starting small-crm");

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    let store = Arc::new(MemoryStore::new());
    let service = CrmService::new(store).with_restock_policy(config.restock_policy());
    let schema = build_schema(service);

    let listener = match TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => exit_with(&CrmError::IoError(e)),
    };

    let shutdown = CancellationToken::new();

    let scheduled = if cli.no_scheduler {
        tracing::info!("Scheduler disabled by --no-scheduler");
        Vec::new()
    } else {
        let transport: Arc<dyn GraphqlTransport> = Arc::new(
            HttpGraphqlClient::new(config.graphql_endpoint())
                .with_timeout(config.request_timeout())
                .with_retry_attempts(config.retry_attempts()),
        );
        let scheduler = JobScheduler::from_config(&config, transport);
        tracing::info!("⏰ Scheduling jobs: {:?}", scheduler.jobs());
        scheduler.start(shutdown.clone())
    };

    tokio::spawn(small_crm::api::cancel_on_signal(
        tokio::signal::ctrl_c(),
        shutdown.clone(),
    ));

    if let Err(e) = small_crm::api::serve(listener, schema, shutdown.clone()).await {
        shutdown.cancel();
        exit_with(&e);
    }

    for handle in scheduled {
        if let Err(e) = handle.await {
            tracing::warn!("⚠️ Scheduled job task ended abnormally: {}", e);
        }
    }
    tracing::info!("👋 small-crm stopped");
}
