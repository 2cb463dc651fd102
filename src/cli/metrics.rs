use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::SampleLaneMetrics;
use crate::parsing::metrics::parse_metrics_file;

#[derive(Args)]
pub struct MetricsArgs {
    /// Metrics CSV file (Adapter_Metrics.csv / Quality_Metrics.csv style)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Restrict output to one sample
    #[arg(short, long)]
    pub sample: Option<String>,
}

/// Execute metrics subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be parsed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MetricsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut merged = parse_metrics_file(&args.input)?;

    if verbose {
        eprintln!(
            "Merged {} (lane, sample) records from {}",
            merged.len(),
            args.input.display()
        );
    }

    if let Some(sample) = &args.sample {
        merged.retain(|m| &m.sample_id == sample);
        if merged.is_empty() {
            anyhow::bail!("sample '{sample}' not present in {}", args.input.display());
        }
    }

    match format {
        OutputFormat::Text => print_text(&merged),
        OutputFormat::Json => print_json(&merged)?,
        OutputFormat::Tsv => print_tsv(&merged),
    }

    Ok(())
}

fn format_bases(bases: Option<u64>) -> String {
    bases.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn print_text(merged: &[SampleLaneMetrics]) {
    for m in merged {
        println!("Lane {} / {}", m.lane, m.sample_id);
        println!(
            "  Sample bases:  R1 {}  R2 {}",
            format_bases(m.r1_sample_bases),
            format_bases(m.r2_sample_bases),
        );
        println!(
            "  Adapter bases: R1 {}  R2 {}  ({:.2}% of sample bases)",
            format_bases(m.r1_adapter_bases),
            format_bases(m.r2_adapter_bases),
            m.adapter_fraction() * 100.0,
        );
        println!(
            "  Yield: {} ({} at Q30, {:.2}%)",
            m.yield_total,
            m.yield_q30,
            m.q30_fraction() * 100.0,
        );
    }
}

fn print_json(merged: &[SampleLaneMetrics]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(merged)?);
    Ok(())
}

fn print_tsv(merged: &[SampleLaneMetrics]) {
    println!(
        "lane\tsample\tr1_sample_bases\tr2_sample_bases\tr1_adapter_bases\tr2_adapter_bases\tyield\tyield_q30"
    );
    for m in merged {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            m.lane,
            m.sample_id,
            format_bases(m.r1_sample_bases),
            format_bases(m.r2_sample_bases),
            format_bases(m.r1_adapter_bases),
            format_bases(m.r2_adapter_bases),
            m.yield_total,
            m.yield_q30,
        );
    }
}
