use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::RunStatistics;
use crate::parsing::conversion::parse_conversion_stats;

#[derive(Args)]
pub struct ConversionArgs {
    /// ConversionStats XML file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Restrict output to one lane
    #[arg(short, long)]
    pub lane: Option<u32>,
}

/// Execute conversion subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be parsed or the requested lane is
/// not present in the file.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ConversionArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let stats = parse_conversion_stats(&args.input)?;

    if verbose {
        eprintln!(
            "Parsed {} (lane, barcode) results from {}",
            stats.result_count(),
            args.input.display()
        );
    }

    if let Some(lane) = args.lane {
        if !stats.lanes.contains(&lane) {
            anyhow::bail!("lane {lane} not present in {}", args.input.display());
        }
    }

    match format {
        OutputFormat::Text => print_text(&stats, args.lane, verbose),
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Tsv => print_tsv(&stats, args.lane),
    }

    Ok(())
}

fn selected_lanes(stats: &RunStatistics, lane: Option<u32>) -> Vec<u32> {
    match lane {
        Some(lane) => vec![lane],
        None => stats.lanes.iter().copied().collect(),
    }
}

fn print_text(stats: &RunStatistics, lane: Option<u32>, verbose: bool) {
    println!("Flow cell: {}", stats.flow_cell_id);
    println!(
        "Projects:  {}",
        stats.projects.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Samples:   {} ({})",
        stats.samples.len(),
        stats.samples.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    for lane in selected_lanes(stats, lane) {
        println!(
            "\nLane {lane}: {} reads across {} barcodes",
            stats.total_reads_for_lane(lane),
            stats.lane_barcodes(lane).map_or(0, std::collections::HashMap::len),
        );

        if !verbose {
            continue;
        }
        let Some(barcodes) = stats.lane_barcodes(lane) else {
            continue;
        };
        let mut barcodes: Vec<_> = barcodes.iter().collect();
        barcodes.sort_by(|a, b| a.0.cmp(b.0));
        for (barcode, result) in barcodes {
            let sample = stats
                .barcode_to_sample
                .get(barcode)
                .map_or("-", String::as_str);
            let one_mismatch = result
                .one_mismatch_barcode_count
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            println!(
                "  {barcode} ({sample}): {} reads, {} perfect, {one_mismatch} one-mismatch",
                result.barcode_count, result.perfect_barcode_count,
            );
        }
    }
}

fn print_json(stats: &RunStatistics) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

fn print_tsv(stats: &RunStatistics, lane: Option<u32>) {
    println!("lane\tbarcode\tsample\tbarcode_count\tperfect_barcode_count\tone_mismatch_barcode_count");
    for lane in selected_lanes(stats, lane) {
        let Some(barcodes) = stats.lane_barcodes(lane) else {
            continue;
        };
        let mut barcodes: Vec<_> = barcodes.iter().collect();
        barcodes.sort_by(|a, b| a.0.cmp(b.0));
        for (barcode, result) in barcodes {
            let sample = stats
                .barcode_to_sample
                .get(barcode)
                .map_or("-", String::as_str);
            let one_mismatch = result
                .one_mismatch_barcode_count
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            println!(
                "{lane}\t{barcode}\t{sample}\t{}\t{}\t{one_mismatch}",
                result.barcode_count, result.perfect_barcode_count,
            );
        }
    }
}
