//! Streaming parser for ConversionStats XML exports.
//!
//! The document nests `Flowcell > Project > Sample > Barcode > Lane`, with
//! integer leaves `BarcodeCount`, `PerfectBarcodeCount` and the optional
//! `OneMismatchBarcodeCount` under each `Lane`. Files can be large, so the
//! document is consumed as a quick-xml event stream rather than a DOM: a
//! small cursor struct tracks the current sample/barcode/lane and the
//! running counters, and a `LaneResult` is finalized each time a `Lane`
//! subtree closes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::{LaneResult, RunStatistics};
use crate::parsing::ParseError;

/// Rollup node present at every level of the tree.
const SENTINEL_ALL: &str = "all";
/// Pseudo-sample holding reads that matched no barcode.
const SENTINEL_UNDETERMINED: &str = "undetermined";

fn is_sentinel_sample(name: &str) -> bool {
    name.eq_ignore_ascii_case(SENTINEL_ALL) || name.eq_ignore_ascii_case(SENTINEL_UNDETERMINED)
}

fn is_sentinel_barcode(name: &str) -> bool {
    name.eq_ignore_ascii_case(SENTINEL_ALL)
}

/// Counter leaf currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterLeaf {
    BarcodeCount,
    PerfectBarcodeCount,
    OneMismatchBarcodeCount,
}

impl CounterLeaf {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"BarcodeCount" => Some(Self::BarcodeCount),
            b"PerfectBarcodeCount" => Some(Self::PerfectBarcodeCount),
            b"OneMismatchBarcodeCount" => Some(Self::OneMismatchBarcodeCount),
            _ => None,
        }
    }
}

/// Cursor state for one pass over the event stream.
///
/// Start events overwrite the axis cursors as the parser descends the tree;
/// the skip flags suppress everything under a sentinel `Sample` or `Barcode`
/// until the next sibling start event resets them.
#[derive(Debug, Default)]
struct Cursor {
    sample: Option<String>,
    barcode: Option<String>,
    lane: Option<u32>,
    skip_sample: bool,
    skip_barcode: bool,
    barcode_count: u64,
    perfect_barcode_count: u64,
    one_mismatch_barcode_count: Option<u64>,
    leaf: Option<CounterLeaf>,
    leaf_text: String,
}

impl Cursor {
    fn skipping(&self) -> bool {
        self.skip_sample || self.skip_barcode
    }

    /// Reset the running counters to their defaults for the next `Lane`.
    /// The optional counter in particular must not leak into a lane that
    /// omits it.
    fn reset_counters(&mut self) {
        self.barcode_count = 0;
        self.perfect_barcode_count = 0;
        self.one_mismatch_barcode_count = None;
    }
}

/// Parse a ConversionStats XML file.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened,
/// `ParseError::Xml` if the document is not well-formed XML, or
/// `ParseError::MalformedInput` if required structure is missing: no
/// `Flowcell` with a `flowcell-id`, a `Lane` closing without barcode
/// context, or a required counter that is not a decimal integer.
pub fn parse_conversion_stats(path: &Path) -> Result<RunStatistics, ParseError> {
    let file = File::open(path)?;
    parse_conversion_stats_reader(BufReader::new(file))
}

/// Parse ConversionStats XML from any buffered reader.
///
/// # Errors
///
/// Same as [`parse_conversion_stats`], minus the file-open failure.
pub fn parse_conversion_stats_reader<R: BufRead>(source: R) -> Result<RunStatistics, ParseError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut stats = RunStatistics::new();
    let mut cursor = Cursor::default();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::Xml(e.to_string()))?
        {
            Event::Start(e) => handle_start(&e, &mut stats, &mut cursor)?,
            Event::End(e) => handle_end(e.name().as_ref(), &mut stats, &mut cursor)?,
            Event::Empty(e) => {
                // A self-closing element is a start immediately followed by
                // its end.
                handle_start(&e, &mut stats, &mut cursor)?;
                handle_end(e.name().as_ref(), &mut stats, &mut cursor)?;
            }
            Event::Text(t) => {
                if cursor.leaf.is_some() {
                    let text = t.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    cursor.leaf_text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stats.flow_cell_id.is_empty() {
        return Err(ParseError::MalformedInput(
            "no Flowcell element with a flowcell-id attribute found".to_string(),
        ));
    }

    Ok(stats)
}

fn handle_start(
    element: &BytesStart<'_>,
    stats: &mut RunStatistics,
    cursor: &mut Cursor,
) -> Result<(), ParseError> {
    match element.name().as_ref() {
        b"Flowcell" => {
            let id = required_attr(element, "flowcell-id")?;
            // First Flowcell node wins.
            if stats.flow_cell_id.is_empty() {
                stats.flow_cell_id = id;
            }
        }
        b"Project" => {
            let name = required_attr(element, "name")?;
            stats.projects.insert(name);
            cursor.sample = None;
            cursor.barcode = None;
            cursor.skip_sample = false;
            cursor.skip_barcode = false;
        }
        b"Sample" => {
            let name = required_attr(element, "name")?;
            cursor.skip_sample = is_sentinel_sample(&name);
            cursor.skip_barcode = false;
            cursor.barcode = None;
            if !cursor.skip_sample {
                stats.samples.insert(name.clone());
            }
            cursor.sample = Some(name);
        }
        b"Barcode" => {
            let name = required_attr(element, "name")?;
            cursor.skip_barcode = is_sentinel_barcode(&name);
            if !cursor.skipping() {
                let sample = cursor.sample.as_ref().ok_or_else(|| {
                    ParseError::MalformedInput(
                        "Barcode element encountered outside of a Sample".to_string(),
                    )
                })?;
                stats.barcodes.insert(name.clone());
                stats
                    .barcode_to_sample
                    .insert(name.clone(), sample.clone());
            }
            cursor.barcode = Some(name);
        }
        b"Lane" => {
            let number = required_attr(element, "number")?;
            let number: u32 = number.trim().parse().map_err(|_| {
                ParseError::MalformedInput(format!("invalid Lane number: '{number}'"))
            })?;
            cursor.lane = Some(number);
            cursor.reset_counters();
            if !cursor.skipping() {
                stats.lanes.insert(number);
            }
        }
        name => {
            if let Some(leaf) = CounterLeaf::from_name(name) {
                cursor.leaf = Some(leaf);
                cursor.leaf_text.clear();
            }
        }
    }
    Ok(())
}

fn handle_end(
    name: &[u8],
    stats: &mut RunStatistics,
    cursor: &mut Cursor,
) -> Result<(), ParseError> {
    match name {
        b"Lane" => {
            if !cursor.skipping() {
                let lane = cursor.lane.ok_or_else(|| {
                    ParseError::MalformedInput("Lane closed without a lane number".to_string())
                })?;
                let barcode = cursor.barcode.clone().ok_or_else(|| {
                    ParseError::MalformedInput(
                        "Lane closed without any barcode context".to_string(),
                    )
                })?;
                stats.insert_lane_result(
                    lane,
                    &barcode,
                    LaneResult::new(
                        cursor.barcode_count,
                        cursor.perfect_barcode_count,
                        cursor.one_mismatch_barcode_count,
                    ),
                );
            }
            cursor.lane = None;
            cursor.reset_counters();
        }
        b"Barcode" => {
            cursor.barcode = None;
            cursor.skip_barcode = false;
        }
        b"Sample" => {
            cursor.sample = None;
            cursor.skip_sample = false;
            cursor.skip_barcode = false;
        }
        name => {
            if let Some(leaf) = CounterLeaf::from_name(name) {
                // Leaf text is only complete once the closing tag arrives.
                if cursor.leaf == Some(leaf) && !cursor.skipping() {
                    let value = parse_count(&cursor.leaf_text, name)?;
                    match leaf {
                        CounterLeaf::BarcodeCount => cursor.barcode_count = value,
                        CounterLeaf::PerfectBarcodeCount => cursor.perfect_barcode_count = value,
                        CounterLeaf::OneMismatchBarcodeCount => {
                            cursor.one_mismatch_barcode_count = Some(value);
                        }
                    }
                }
                cursor.leaf = None;
                cursor.leaf_text.clear();
            }
        }
    }
    Ok(())
}

fn parse_count(text: &str, name: &[u8]) -> Result<u64, ParseError> {
    text.trim().parse().map_err(|_| {
        ParseError::MalformedInput(format!(
            "invalid {} value: '{}'",
            String::from_utf8_lossy(name),
            text.trim()
        ))
    })
}

fn required_attr(element: &BytesStart<'_>, name: &str) -> Result<String, ParseError> {
    let attribute = element
        .try_get_attribute(name)
        .map_err(|e| ParseError::Xml(e.to_string()))?
        .ok_or_else(|| {
            ParseError::MalformedInput(format!(
                "<{}> element missing {name} attribute",
                String::from_utf8_lossy(element.name().as_ref())
            ))
        })?;
    let value = attribute
        .unescape_value()
        .map_err(|e| ParseError::Xml(e.to_string()))?;
    Ok(value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<RunStatistics, ParseError> {
        parse_conversion_stats_reader(xml.as_bytes())
    }

    const SINGLE_LANE: &str = r#"
        <Stats>
          <Flowcell flowcell-id="HABCDEFGH">
            <Project name="P1">
              <Sample name="S1">
                <Barcode name="ATCG">
                  <Lane number="1">
                    <BarcodeCount>1000</BarcodeCount>
                    <PerfectBarcodeCount>950</PerfectBarcodeCount>
                  </Lane>
                </Barcode>
              </Sample>
            </Project>
          </Flowcell>
        </Stats>"#;

    #[test]
    fn test_parse_single_lane() {
        let stats = parse(SINGLE_LANE).unwrap();

        assert_eq!(stats.flow_cell_id, "HABCDEFGH");
        assert_eq!(stats.projects.iter().collect::<Vec<_>>(), ["P1"]);
        assert_eq!(stats.samples.iter().collect::<Vec<_>>(), ["S1"]);
        assert_eq!(stats.barcodes.iter().collect::<Vec<_>>(), ["ATCG"]);
        assert_eq!(stats.lanes.iter().collect::<Vec<_>>(), [&1]);
        assert_eq!(stats.barcode_to_sample["ATCG"], "S1");
        assert_eq!(
            stats.lane_result(1, "ATCG"),
            Some(LaneResult::new(1000, 950, None))
        );
    }

    #[test]
    fn test_undetermined_sample_is_skipped() {
        let xml = SINGLE_LANE.replace(r#"name="S1""#, r#"name="Undetermined""#);
        let stats = parse(&xml).unwrap();

        assert!(stats.samples.is_empty());
        assert!(stats.barcodes.is_empty());
        assert!(stats.lanes.is_empty());
        assert!(stats.barcode_to_sample.is_empty());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_all_rollup_nodes_are_skipped() {
        let xml = r#"
            <Stats>
              <Flowcell flowcell-id="HABCDEFGH">
                <Project name="P1">
                  <Sample name="all">
                    <Barcode name="all">
                      <Lane number="1">
                        <BarcodeCount>9999</BarcodeCount>
                        <PerfectBarcodeCount>9999</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                  </Sample>
                  <Sample name="S1">
                    <Barcode name="all">
                      <Lane number="1">
                        <BarcodeCount>1500</BarcodeCount>
                        <PerfectBarcodeCount>1400</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                    <Barcode name="ATCG">
                      <Lane number="1">
                        <BarcodeCount>1000</BarcodeCount>
                        <PerfectBarcodeCount>950</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                  </Sample>
                </Project>
              </Flowcell>
            </Stats>"#;
        let stats = parse(xml).unwrap();

        assert_eq!(stats.samples.iter().collect::<Vec<_>>(), ["S1"]);
        assert_eq!(stats.barcodes.iter().collect::<Vec<_>>(), ["ATCG"]);
        assert_eq!(stats.result_count(), 1);
        assert_eq!(
            stats.lane_result(1, "ATCG"),
            Some(LaneResult::new(1000, 950, None))
        );
        // The per-sample "all" rollup contributed nothing.
        assert!(stats.barcode_lanes("all").is_none());
    }

    #[test]
    fn test_dual_indexes_stay_symmetric() {
        let xml = r#"
            <Stats>
              <Flowcell flowcell-id="HABCDEFGH">
                <Project name="P1">
                  <Sample name="S1">
                    <Barcode name="ATCG">
                      <Lane number="1">
                        <BarcodeCount>1000</BarcodeCount>
                        <PerfectBarcodeCount>950</PerfectBarcodeCount>
                      </Lane>
                      <Lane number="2">
                        <BarcodeCount>800</BarcodeCount>
                        <PerfectBarcodeCount>790</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                  </Sample>
                  <Sample name="S2">
                    <Barcode name="GGTT">
                      <Lane number="1">
                        <BarcodeCount>600</BarcodeCount>
                        <PerfectBarcodeCount>580</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                  </Sample>
                </Project>
              </Flowcell>
            </Stats>"#;
        let stats = parse(xml).unwrap();

        for (lane, barcode) in [(1, "ATCG"), (2, "ATCG"), (1, "GGTT")] {
            let via_lane = stats.lane_barcodes(lane).unwrap()[barcode];
            let via_barcode = stats.barcode_lanes(barcode).unwrap()[&lane];
            assert_eq!(via_lane, via_barcode);
        }
        assert_eq!(stats.total_reads_for_lane(1), 1600);
    }

    #[test]
    fn test_one_mismatch_count_does_not_leak_between_lanes() {
        let xml = r#"
            <Stats>
              <Flowcell flowcell-id="HABCDEFGH">
                <Project name="P1">
                  <Sample name="S1">
                    <Barcode name="ATCG">
                      <Lane number="1">
                        <BarcodeCount>1000</BarcodeCount>
                        <PerfectBarcodeCount>950</PerfectBarcodeCount>
                        <OneMismatchBarcodeCount>50</OneMismatchBarcodeCount>
                      </Lane>
                      <Lane number="2">
                        <BarcodeCount>800</BarcodeCount>
                        <PerfectBarcodeCount>790</PerfectBarcodeCount>
                      </Lane>
                    </Barcode>
                  </Sample>
                </Project>
              </Flowcell>
            </Stats>"#;
        let stats = parse(xml).unwrap();

        assert_eq!(
            stats.lane_result(1, "ATCG"),
            Some(LaneResult::new(1000, 950, Some(50)))
        );
        // Lane 2 omits the optional counter, so it must be absent, not 50.
        assert_eq!(
            stats.lane_result(2, "ATCG"),
            Some(LaneResult::new(800, 790, None))
        );
    }

    #[test]
    fn test_lane_without_barcode_context_is_malformed() {
        let xml = r#"
            <Stats>
              <Flowcell flowcell-id="HABCDEFGH">
                <Project name="P1">
                  <Sample name="S1">
                    <Lane number="1">
                      <BarcodeCount>1000</BarcodeCount>
                      <PerfectBarcodeCount>950</PerfectBarcodeCount>
                    </Lane>
                  </Sample>
                </Project>
              </Flowcell>
            </Stats>"#;
        let err = parse(xml).unwrap_err();
        assert!(matches!(err, ParseError::MalformedInput(_)));
    }

    #[test]
    fn test_missing_flowcell_id_is_malformed() {
        let err = parse("<Stats><Flowcell><Project name=\"P1\"/></Flowcell></Stats>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedInput(_)));

        let err = parse("<Stats></Stats>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedInput(_)));
    }

    #[test]
    fn test_invalid_barcode_count_is_malformed() {
        let xml = SINGLE_LANE.replace("1000", "not-a-number");
        let err = parse(&xml).unwrap_err();
        assert!(matches!(err, ParseError::MalformedInput(_)));
    }

    #[test]
    fn test_counter_text_with_whitespace() {
        let xml = SINGLE_LANE.replace(
            "<BarcodeCount>1000</BarcodeCount>",
            "<BarcodeCount>  1000  </BarcodeCount>",
        );
        let stats = parse(&xml).unwrap();
        assert_eq!(
            stats.lane_result(1, "ATCG"),
            Some(LaneResult::new(1000, 950, None))
        );
    }

    #[test]
    fn test_first_flowcell_id_wins() {
        let xml = r#"
            <Stats>
              <Flowcell flowcell-id="FIRST"></Flowcell>
              <Flowcell flowcell-id="SECOND"></Flowcell>
            </Stats>"#;
        let stats = parse(xml).unwrap();
        assert_eq!(stats.flow_cell_id, "FIRST");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_conversion_stats(Path::new("/nonexistent/ConversionStats.xml"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
