//! Command-line interface for demux-stats.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **conversion**: Summarize a ConversionStats XML export
//! - **metrics**: Merge a flat metrics CSV into per-(lane, sample) records
//!
//! ## Usage
//!
//! ```text
//! # Summarize a demultiplexed run
//! demux-stats conversion ConversionStats.xml
//!
//! # Per-(lane, barcode) breakdown
//! demux-stats conversion ConversionStats.xml --verbose
//!
//! # JSON output for scripting
//! demux-stats conversion ConversionStats.xml --format json
//!
//! # Merge bcl-convert quality metrics
//! demux-stats metrics Quality_Metrics.csv --format tsv
//! ```

use clap::{Parser, Subcommand};

pub mod conversion;
pub mod metrics;

#[derive(Parser)]
#[command(name = "demux-stats")]
#[command(version)]
#[command(about = "Parse Illumina demultiplexing statistics exports")]
#[command(
    long_about = "demux-stats reads the statistics files written after demultiplexing a \
sequencing run and turns them into queryable summaries.\n\nIt understands the nested \
ConversionStats XML export (per-lane, per-sample, per-barcode read counts) and the flat \
bcl-convert style metrics CSVs (adapter and quality yields per lane, sample and read \
direction)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a ConversionStats XML export
    Conversion(conversion::ConversionArgs),

    /// Merge a flat metrics CSV into per-(lane, sample) records
    Metrics(metrics::MetricsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
