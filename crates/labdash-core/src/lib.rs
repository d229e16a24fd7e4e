//! Aggregation and caching of switch bring-up test reports.
//!
//! Reports live under `<report_base>/<platform>/all_test_<date>/` as
//! `.tar.gz` archives or extracted directories. [`Dashboard`] walks a run
//! directory into a [`models::Summary`], caches it next to the reports, and
//! serves trend and diff views built from those summaries.

pub mod bundle;
pub mod cache;
pub mod classify;
pub mod config;
mod dashboard;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod models;
pub mod notes;
pub mod reconcile;
pub mod test_log;
pub mod trend;
pub mod walker;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use error::{DashboardError, ErrorPayload, Result};
