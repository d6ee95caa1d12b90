pub mod mutations;
pub mod queries;
pub mod service;

pub use crate::domain::model::{Customer, Order, Product};
pub use crate::domain::ports::{CrmStore, GraphqlTransport, LogSink};
pub use crate::utils::error::Result;
pub use service::{CrmService, RestockPolicy};
