use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Read counts for one (lane, barcode) pair from a conversion-stats export.
///
/// Created exactly once per pair present in the input and never mutated
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneResult {
    /// Total reads assigned to this barcode in this lane.
    pub barcode_count: u64,

    /// Reads that matched the expected barcode with zero mismatches.
    pub perfect_barcode_count: u64,

    /// Reads with exactly one mismatch. Some producers omit this field,
    /// in which case it is absent rather than zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_mismatch_barcode_count: Option<u64>,
}

impl LaneResult {
    #[must_use]
    pub fn new(
        barcode_count: u64,
        perfect_barcode_count: u64,
        one_mismatch_barcode_count: Option<u64>,
    ) -> Self {
        Self {
            barcode_count,
            perfect_barcode_count,
            one_mismatch_barcode_count,
        }
    }
}

/// Aggregated statistics for one demultiplexed sequencing run.
///
/// Populated by a single streaming pass over a conversion-stats file and
/// read-only afterwards. The per-(lane, barcode) results are held in two
/// indexes, one keyed by lane and one by barcode, so lookups are symmetric;
/// both are written through [`RunStatistics::insert_lane_result`] only,
/// which keeps them in lockstep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    /// Flow cell identifier from the first `Flowcell` node.
    pub flow_cell_id: String,

    /// Every project name seen.
    pub projects: BTreeSet<String>,

    /// Every sample name seen, excluding the "all"/"undetermined" sentinels.
    pub samples: BTreeSet<String>,

    /// Every barcode seen, excluding the "all" sentinel.
    pub barcodes: BTreeSet<String>,

    /// Every lane number seen.
    pub lanes: BTreeSet<u32>,

    /// Barcode to sample name. Last write wins if a barcode is reused
    /// across samples, which well-formed input does not do.
    pub barcode_to_sample: HashMap<String, String>,

    lane_to_barcode: HashMap<u32, HashMap<String, LaneResult>>,
    barcode_to_lane: HashMap<String, HashMap<u32, LaneResult>>,
}

impl RunStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the result for a (lane, barcode) pair into both indexes.
    pub fn insert_lane_result(&mut self, lane: u32, barcode: &str, result: LaneResult) {
        self.lane_to_barcode
            .entry(lane)
            .or_default()
            .insert(barcode.to_string(), result);
        self.barcode_to_lane
            .entry(barcode.to_string())
            .or_default()
            .insert(lane, result);
    }

    /// All barcode results for a lane.
    #[must_use]
    pub fn lane_barcodes(&self, lane: u32) -> Option<&HashMap<String, LaneResult>> {
        self.lane_to_barcode.get(&lane)
    }

    /// All lane results for a barcode.
    #[must_use]
    pub fn barcode_lanes(&self, barcode: &str) -> Option<&HashMap<u32, LaneResult>> {
        self.barcode_to_lane.get(barcode)
    }

    /// The result for one (lane, barcode) pair.
    #[must_use]
    pub fn lane_result(&self, lane: u32, barcode: &str) -> Option<LaneResult> {
        self.lane_to_barcode
            .get(&lane)
            .and_then(|barcodes| barcodes.get(barcode))
            .copied()
    }

    /// Total reads across every barcode in a lane.
    #[must_use]
    pub fn total_reads_for_lane(&self, lane: u32) -> u64 {
        self.lane_to_barcode
            .get(&lane)
            .map(|barcodes| barcodes.values().map(|r| r.barcode_count).sum())
            .unwrap_or(0)
    }

    /// Number of (lane, barcode) results held.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.lane_to_barcode.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lane_to_barcode.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_indexes_symmetric() {
        let mut stats = RunStatistics::new();
        stats.insert_lane_result(1, "ATCG", LaneResult::new(1000, 950, Some(40)));
        stats.insert_lane_result(2, "ATCG", LaneResult::new(800, 790, None));
        stats.insert_lane_result(1, "GGTT", LaneResult::new(500, 480, None));

        for (lane, barcodes) in [(1, vec!["ATCG", "GGTT"]), (2, vec!["ATCG"])] {
            for barcode in barcodes {
                let via_lane = stats.lane_barcodes(lane).unwrap()[barcode];
                let via_barcode = stats.barcode_lanes(barcode).unwrap()[&lane];
                assert_eq!(via_lane, via_barcode);
            }
        }
        assert_eq!(stats.result_count(), 3);
    }

    #[test]
    fn test_lane_result_lookup() {
        let mut stats = RunStatistics::new();
        stats.insert_lane_result(1, "ATCG", LaneResult::new(1000, 950, None));

        assert_eq!(
            stats.lane_result(1, "ATCG"),
            Some(LaneResult::new(1000, 950, None))
        );
        assert_eq!(stats.lane_result(2, "ATCG"), None);
        assert_eq!(stats.lane_result(1, "TTTT"), None);
    }

    #[test]
    fn test_total_reads_for_lane() {
        let mut stats = RunStatistics::new();
        stats.insert_lane_result(1, "ATCG", LaneResult::new(1000, 950, None));
        stats.insert_lane_result(1, "GGTT", LaneResult::new(500, 480, None));
        stats.insert_lane_result(2, "ATCG", LaneResult::new(300, 290, None));

        assert_eq!(stats.total_reads_for_lane(1), 1500);
        assert_eq!(stats.total_reads_for_lane(2), 300);
        assert_eq!(stats.total_reads_for_lane(3), 0);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = RunStatistics::new();
        assert!(stats.is_empty());
        assert_eq!(stats.result_count(), 0);
        assert!(stats.lane_barcodes(1).is_none());
        assert!(stats.barcode_lanes("ATCG").is_none());
    }
}
