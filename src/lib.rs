//! # demux-stats
//!
//! A library for parsing the statistics exports produced by Illumina
//! demultiplexing into queryable in-memory aggregates.
//!
//! After a sequencing run is demultiplexed, the conversion step writes a
//! nested per-flow-cell XML export (project → sample → barcode → lane read
//! counts) and, depending on the producer, flat CSV metrics files with one
//! row per (lane, read-direction, sample). `demux-stats` parses both
//! without loading whole documents into memory and returns aggregates that
//! downstream reporting code can query by lane or by barcode.
//!
//! ## Example
//!
//! ```rust,no_run
//! use demux_stats::parsing::conversion::parse_conversion_stats;
//! use std::path::Path;
//!
//! let stats = parse_conversion_stats(Path::new("ConversionStats.xml")).unwrap();
//!
//! println!("flow cell {}", stats.flow_cell_id);
//! for &lane in &stats.lanes {
//!     println!("lane {lane}: {} reads", stats.total_reads_for_lane(lane));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Aggregate types ([`RunStatistics`], [`LaneResult`],
//!   [`SampleLaneMetrics`])
//! - [`parsing`]: Streaming XML and CSV parsers
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;

// Re-export commonly used types for convenience
pub use core::metrics::SampleLaneMetrics;
pub use core::stats::{LaneResult, RunStatistics};
pub use parsing::ParseError;
