pub mod analytics;
pub mod cache;
pub mod config;
pub mod daterange;
pub mod enrich;
pub mod error;
pub mod feeds;
pub mod ingest;
pub mod model;
pub mod output;
pub mod ratelimit;
pub mod service;

pub use cache::Cache;
pub use config::Config;
pub use error::IntelError;
pub use model::{AnalyticsSummary, BulkReport, CveReport, Suggestion};
pub use ratelimit::RateLimiter;
pub use service::CveService;
