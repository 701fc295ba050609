mod client;
mod models;
pub mod taxonomy;
mod transport;

pub use client::{NewsApiClient, NewsProvider};
pub use models::{ArticleRecord, FetchParams, SourceRecord};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};
