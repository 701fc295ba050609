mod service;
pub mod tasks;

pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{
    run_headline_fetch_concurrent, run_headline_fetch_sequential, run_source_refresh, FetchRun,
    SourceOutcome,
};
