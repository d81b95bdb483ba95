pub mod args;
pub mod classify;
pub mod dashboard;
pub mod error;
pub mod geo;
pub mod reader;
pub mod report;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use classify::LogRecord;
pub use dashboard::{generate_dashboard, print_summary, DashboardSummary};
pub use error::StatsError;
pub use geo::{GeoCache, GeoLookup, GeoResolver, IpApiClient};
pub use stats::{aggregate, AggregateSnapshot, Counter};
