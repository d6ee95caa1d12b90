// Adapters layer: concrete implementations for external systems (store, http, log files).

pub mod http_transport;
pub mod log_sink;
pub mod memory_store;

pub use http_transport::HttpGraphqlClient;
pub use log_sink::{FileSink, MemorySink};
pub use memory_store::MemoryStore;
