pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod jobs;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{CrmConfig, JobSettings};

pub use adapters::{FileSink, HttpGraphqlClient, MemorySink, MemoryStore};
pub use api::{build_schema, CrmSchema, InProcessTransport};
pub use core::{CrmService, RestockPolicy};
pub use jobs::{run_now, JobKind, JobReport, JobScheduler, ScheduledJob};
pub use utils::error::{CrmError, Result};
