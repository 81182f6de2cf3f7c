//! HTTP API handlers for drg-gw

pub mod health;
pub mod reports;
pub mod research;

pub use health::health_routes;
pub use reports::{delete_report, download_report, get_report, list_reports};
pub use research::research_stream;
