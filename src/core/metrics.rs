use serde::Serialize;

/// Helper function to convert u64 count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Merged metrics for one (lane, sample) pair from a bcl-convert style
/// metrics CSV.
///
/// The source files carry one row per (lane, read-direction, sample); the
/// parser folds the forward and reverse rows into one record, projecting
/// per-read fields into the `r1_*`/`r2_*` slots and summing the additive
/// yield fields across all merged rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleLaneMetrics {
    pub lane: u32,
    pub sample_id: String,

    /// Sample bases from the read-1 row, when the column is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r1_sample_bases: Option<u64>,

    /// Sample bases from the read-2 row, when the column is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_sample_bases: Option<u64>,

    /// Adapter-trimmed bases from the read-1 row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r1_adapter_bases: Option<u64>,

    /// Adapter-trimmed bases from the read-2 row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_adapter_bases: Option<u64>,

    /// Total yield in bases, summed over both read directions.
    pub yield_total: u64,

    /// Yield at Q30 or better, summed over both read directions.
    pub yield_q30: u64,
}

impl SampleLaneMetrics {
    #[must_use]
    pub fn new(lane: u32, sample_id: impl Into<String>) -> Self {
        Self {
            lane,
            sample_id: sample_id.into(),
            r1_sample_bases: None,
            r2_sample_bases: None,
            r1_adapter_bases: None,
            r2_adapter_bases: None,
            yield_total: 0,
            yield_q30: 0,
        }
    }

    /// Fraction of yielded bases at Q30 or better, 0.0 when there is no yield.
    #[must_use]
    pub fn q30_fraction(&self) -> f64 {
        if self.yield_total == 0 {
            return 0.0;
        }
        count_to_f64(self.yield_q30) / count_to_f64(self.yield_total)
    }

    /// Fraction of sample bases that were adapter, across both directions.
    /// 0.0 when either total is unavailable.
    #[must_use]
    pub fn adapter_fraction(&self) -> f64 {
        let sample_bases = self.r1_sample_bases.unwrap_or(0) + self.r2_sample_bases.unwrap_or(0);
        if sample_bases == 0 {
            return 0.0;
        }
        let adapter_bases = self.r1_adapter_bases.unwrap_or(0) + self.r2_adapter_bases.unwrap_or(0);
        count_to_f64(adapter_bases) / count_to_f64(sample_bases)
    }
}
