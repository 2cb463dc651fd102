//! Parsers for demultiplexing statistics exports.
//!
//! This module provides parsers for:
//!
//! - **ConversionStats XML**: the nested `Flowcell > Project > Sample >
//!   Barcode > Lane` tree written after demultiplexing, streamed into a
//!   [`crate::core::RunStatistics`]
//! - **Metrics CSV**: the flat bcl-convert style exports
//!   (`Adapter_Metrics.csv`, `Quality_Metrics.csv`) with one row per
//!   (lane, read-direction, sample), merged into
//!   [`crate::core::SampleLaneMetrics`] records
//!
//! ## Example
//!
//! ```rust,no_run
//! use demux_stats::parsing::conversion::parse_conversion_stats;
//! use std::path::Path;
//!
//! let stats = parse_conversion_stats(Path::new("ConversionStats.xml")).unwrap();
//! println!("{} lanes on {}", stats.lanes.len(), stats.flow_cell_id);
//! ```
//!
//! All parsers are a single synchronous pass over one file; a structurally
//! malformed file is a fatal [`ParseError`] with no partial result, while a
//! missing optional field simply leaves the output field unset.

use thiserror::Error;

pub mod conversion;
pub mod metrics;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}
