pub mod fetch;
pub mod list;
pub mod refresh;
pub mod serve;
pub mod sources;
