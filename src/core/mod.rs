//! Core data types for demultiplexing statistics.
//!
//! This module provides the aggregates the parsers populate:
//!
//! - [`RunStatistics`]: per-run read counts, indexed by lane and by barcode
//! - [`LaneResult`]: counts for one (lane, barcode) pair
//! - [`SampleLaneMetrics`]: merged per-(lane, sample) metrics from the
//!   flat CSV exports
//!
//! ## Sentinel names
//!
//! Conversion-stats exports carry rollup nodes named `all` (per-project and
//! per-barcode totals) and an `Undetermined` pseudo-sample for reads that
//! matched no barcode. These never appear in the populated aggregates; the
//! parser skips their whole subtree.
//!
//! All aggregates are populated once during a parse and read-only
//! afterwards, so a shared reference can be handed out to multiple threads.

pub mod metrics;
pub mod stats;

pub use metrics::SampleLaneMetrics;
pub use stats::{LaneResult, RunStatistics};
