pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod news;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{Error, Result, UpstreamError, UpstreamErrorKind};
pub use ingest::IngestionService;
pub use scheduler::{SchedulerEvent, SchedulerService};
