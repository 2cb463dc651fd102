//! Parser for flat metrics CSV exports (bcl-convert `Adapter_Metrics.csv`
//! and `Quality_Metrics.csv` style).
//!
//! These files carry one row per (lane, read-direction, sample). Rows are
//! reduced in two passes: first grouped by lane and (read-number, sample-id)
//! key, then the read-direction rows of each (lane, sample) are merged into
//! one [`SampleLaneMetrics`]. Per-read base counts are projected into
//! `r1_*`/`r2_*` fields while yield fields are summed across every row that
//! feeds the merged record.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::core::SampleLaneMetrics;
use crate::parsing::ParseError;

/// Resolved positions of the columns we read.
#[derive(Debug)]
struct ColumnIndex {
    lane: usize,
    sample_id: usize,
    read_number: usize,
    sample_bases: Option<usize>,
    adapter_bases: Option<usize>,
    yield_total: Option<usize>,
    yield_q30: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ParseError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        let lane = find(&["Lane"])
            .ok_or_else(|| ParseError::MalformedInput("missing Lane column".to_string()))?;
        // Producers disagree on the sample column name.
        let sample_id = find(&["SampleID", "Sample_ID"]).ok_or_else(|| {
            ParseError::MalformedInput("missing SampleID/Sample_ID column".to_string())
        })?;
        let read_number = find(&["ReadNumber"])
            .ok_or_else(|| ParseError::MalformedInput("missing ReadNumber column".to_string()))?;

        Ok(Self {
            lane,
            sample_id,
            read_number,
            sample_bases: find(&["SampleBases"]),
            adapter_bases: find(&["AdapterBases"]),
            yield_total: find(&["Yield"]),
            yield_q30: find(&["YieldQ30"]),
        })
    }
}

/// One row after column resolution, before merging.
#[derive(Debug, Default, Clone)]
struct RawRow {
    sample_bases: Option<u64>,
    adapter_bases: Option<u64>,
    yield_total: u64,
    yield_q30: u64,
}

/// Parse a metrics CSV file into merged per-(lane, sample) records.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, `ParseError::Csv`
/// on CSV-level failures, or `ParseError::MalformedInput` if a required
/// column (`Lane`, `SampleID`/`Sample_ID`, `ReadNumber`) is missing or a
/// numeric field does not parse. Missing optional metric columns are not
/// errors; the corresponding output fields stay unset.
pub fn parse_metrics_file(path: &Path) -> Result<Vec<SampleLaneMetrics>, ParseError> {
    let file = File::open(path)?;
    parse_metrics_reader(file)
}

/// Parse metrics CSV from any reader. See [`parse_metrics_file`].
///
/// # Errors
///
/// Same as [`parse_metrics_file`], minus the file-open failure.
pub fn parse_metrics_reader<R: Read>(source: R) -> Result<Vec<SampleLaneMetrics>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    // Pass 1: group rows by lane, then by (read-number, sample-id). A
    // duplicate key overwrites the per-read base counts with the later row
    // but keeps accumulating the yield fields; the source format's producer
    // behaves this way, inconsistent as it is.
    let mut by_lane: BTreeMap<u32, BTreeMap<(u32, String), RawRow>> = BTreeMap::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1; data rows start at line 2.
        let line = index + 2;

        let lane = parse_field::<u32>(&record, columns.lane, "Lane", line)?;
        let read_number =
            parse_field::<u32>(&record, columns.read_number, "ReadNumber", line)?;
        let sample_id = record
            .get(columns.sample_id)
            .unwrap_or_default()
            .to_string();

        let entry = by_lane
            .entry(lane)
            .or_default()
            .entry((read_number, sample_id.clone()));
        let row = match entry {
            std::collections::btree_map::Entry::Occupied(occupied) => {
                warn!(
                    lane,
                    read_number,
                    sample = %sample_id,
                    line,
                    "duplicate metrics row, summing yields over it"
                );
                occupied.into_mut()
            }
            std::collections::btree_map::Entry::Vacant(vacant) => {
                vacant.insert(RawRow::default())
            }
        };

        if let Some(col) = columns.sample_bases {
            row.sample_bases = parse_optional_field(&record, col, "SampleBases", line)?;
        }
        if let Some(col) = columns.adapter_bases {
            row.adapter_bases = parse_optional_field(&record, col, "AdapterBases", line)?;
        }
        if let Some(col) = columns.yield_total {
            row.yield_total += parse_optional_field(&record, col, "Yield", line)?.unwrap_or(0);
        }
        if let Some(col) = columns.yield_q30 {
            row.yield_q30 += parse_optional_field(&record, col, "YieldQ30", line)?.unwrap_or(0);
        }
    }

    // Pass 2: fold the read-direction rows of each (lane, sample) into one
    // merged record.
    let mut merged = Vec::new();
    for (lane, rows) in by_lane {
        let mut per_sample: BTreeMap<String, SampleLaneMetrics> = BTreeMap::new();
        for ((read_number, sample_id), row) in rows {
            let metrics = per_sample
                .entry(sample_id.clone())
                .or_insert_with(|| SampleLaneMetrics::new(lane, sample_id));
            match read_number {
                1 => {
                    metrics.r1_sample_bases = row.sample_bases;
                    metrics.r1_adapter_bases = row.adapter_bases;
                }
                2 => {
                    metrics.r2_sample_bases = row.sample_bases;
                    metrics.r2_adapter_bases = row.adapter_bases;
                }
                // Index reads and the like carry no per-direction slot but
                // still contribute to the yield sums below.
                _ => {}
            }
            metrics.yield_total += row.yield_total;
            metrics.yield_q30 += row.yield_q30;
        }
        merged.extend(per_sample.into_values());
    }

    Ok(merged)
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<T, ParseError> {
    let value = record.get(index).unwrap_or_default();
    value.parse().map_err(|_| {
        ParseError::MalformedInput(format!(
            "invalid {column} value on line {line}: '{value}'"
        ))
    })
}

/// An empty cell in an optional column is absent, not zero and not an error.
fn parse_optional_field(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<Option<u64>, ParseError> {
    let value = record.get(index).unwrap_or_default();
    if value.is_empty() {
        return Ok(None);
    }
    parse_field(record, index, column, line).map(Some)
}
