//! Core data types for the three upstream feeds and the joined entities.
//!
//! Wire-format types mirror each upstream's JSON shape:
//!
//! - [`NvdResponse`] / [`NvdCveItem`] - NVD CVE API 2.0 records
//! - [`EpssScore`] - FIRST.org EPSS probability/percentile scores
//! - [`KevCatalog`] / [`KevEntry`] - CISA Known Exploited Vulnerabilities
//!
//! Joined and derived types are what the aggregation layer hands to callers:
//!
//! - [`CveReport`] - one CVE merged across all three feeds
//! - [`AnalyticsSummary`] - batch statistics over a set of reports
//! - [`BulkReport`] / [`BulkOutcome`] - per-item accounting for bulk lookups

mod epss;
mod kev;
mod nvd;
mod report;

pub use epss::*;
pub use kev::*;
pub use nvd::*;
pub use report::*;
