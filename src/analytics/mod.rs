//! Sales aggregation, demand estimation and the reports built on them.
//!
//! Every report is recomputed from the store on each call; nothing here
//! keeps state between requests.

pub mod aggregator;
pub mod digest;
pub mod estimator;
pub mod params;
pub mod reports;

#[cfg(test)]
pub(crate) mod memory;

pub use aggregator::SalesWindow;
pub use digest::executive_digest;
pub use params::{ChartQuery, ReportParams, ReportQuery};
pub use reports::{demand_forecast, inventory_insights};
