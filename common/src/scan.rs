//! Line scanner for the mixed BST experiment log.
//!
//! The log interleaves prose, per-method sections, a comparison section and
//! CSV rows. Every line is classified against an ordered set of rules and the
//! result is applied to an explicit [`ScanState`]:
//!
//! 1. a method marker selects that method and leaves the comparison block,
//! 2. otherwise a comparison-block marker selects [`Method::Comparison`],
//! 3. outside the comparison block, an experiment marker selects the kind,
//! 4. inside it, a `*-Comparison` marker selects the `*_comp` kind,
//! 5. independently, a comma-separated numeric line is appended to the
//!    active `(method, kind)` sequence.
//!
//! Rules 1/2 clear the active kind, so rows after a bare method header are
//! never attributed to the previous method's experiment.

use std::path::Path;

use eyre::Result;
use tracing::{debug, trace};

use crate::{
    error::read_input,
    matrix::{ExperimentKind, Method, Row, SectionMatrix},
};

const COMPARISON_MARKER: &str = "COMPARISON";
const COMPARISON_QUALIFIER: &str = "All Four Methods";
const DECORATION: &str = "===";
const COLUMN_HEADER: &str = "n,";

/// Experiment markers outside the comparison block, in priority order.
const EXPERIMENT_MARKERS: [(&str, ExperimentKind); 4] = [
    ("Height", ExperimentKind::Height),
    ("Build Time", ExperimentKind::Build),
    ("Destroy Time", ExperimentKind::Destroy),
    ("Inorder Walk", ExperimentKind::Inorder),
];

/// Experiment markers inside the comparison block. Each also needs
/// [`DECORATION`] on the same line.
const COMPARISON_MARKERS: [(&str, ExperimentKind); 4] = [
    ("Height Comparison", ExperimentKind::HeightComp),
    ("Build Time Comparison", ExperimentKind::BuildComp),
    ("Destroy Time Comparison", ExperimentKind::DestroyComp),
    ("Inorder Walk Comparison", ExperimentKind::InorderComp),
];

/// A header that switches the active method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Method(Method),
    Comparison,
}

type BlockRule = fn(&str) -> Option<Block>;

/// Rules 1 and 2, first hit wins.
const BLOCK_RULES: [BlockRule; 2] = [method_header, comparison_header];

fn method_header(line: &str) -> Option<Block> {
    Method::SHUFFLES
        .into_iter()
        .find(|m| line.contains(m.marker()))
        .map(Block::Method)
}

fn comparison_header(line: &str) -> Option<Block> {
    (line.contains(COMPARISON_MARKER) && line.contains(COMPARISON_QUALIFIER))
        .then_some(Block::Comparison)
}

fn experiment_header(line: &str) -> Option<ExperimentKind> {
    EXPERIMENT_MARKERS
        .into_iter()
        .find(|(marker, _)| line.contains(marker))
        .map(|(_, kind)| kind)
}

fn comparison_experiment_header(line: &str) -> Option<ExperimentKind> {
    if !line.contains(DECORATION) {
        return None;
    }
    COMPARISON_MARKERS
        .into_iter()
        .find(|(marker, _)| line.contains(marker))
        .map(|(_, kind)| kind)
}

/// What rule 5 makes of a line.
#[derive(Debug, Clone, PartialEq)]
pub enum DataLine {
    /// No comma, so not a candidate.
    None,
    /// A CSV column header such as `n,avg_height`.
    ColumnHeader,
    /// Looked like data but did not parse, or had an unusable shape.
    Malformed,
    Row(Row),
}

/// Parses a candidate data line. Every field must be numeric, there must be
/// at least two of them and the leading tree size must be positive.
/// Fractional sizes are accepted as is.
pub fn parse_data_line(line: &str) -> DataLine {
    if !line.contains(',') {
        return DataLine::None;
    }
    if line.starts_with(COLUMN_HEADER) {
        return DataLine::ColumnHeader;
    }

    let row: Option<Row> = line
        .split(',')
        .map(|field| field.trim().parse::<f64>().ok())
        .collect();
    match row {
        Some(row) if row.len() >= 2 && row[0].is_finite() && row[0] > 0.0 => DataLine::Row(row),
        _ => DataLine::Malformed,
    }
}

/// Result of classifying one line against the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub block: Option<Block>,
    pub experiment: Option<ExperimentKind>,
    pub data: DataLine,
}

/// Scanner state carried from line to line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanState {
    pub method: Option<Method>,
    pub kind: Option<ExperimentKind>,
    pub in_comparison: bool,
}

impl ScanState {
    /// Classifies a trimmed line. Experiment detection sees the block the
    /// same line may have just opened.
    pub fn classify(&self, line: &str) -> Classified {
        let block = BLOCK_RULES.iter().find_map(|rule| rule(line));

        let (method, in_comparison) = match block {
            Some(Block::Method(m)) => (Some(m), false),
            Some(Block::Comparison) => (Some(Method::Comparison), true),
            None => (self.method, self.in_comparison),
        };

        let experiment = if in_comparison {
            comparison_experiment_header(line)
        } else if method.is_some() {
            experiment_header(line)
        } else {
            None
        };

        Classified {
            block,
            experiment,
            data: parse_data_line(line),
        }
    }

    /// Applies a classified line, appending its row if one is active.
    pub fn apply(&mut self, classified: Classified, matrix: &mut SectionMatrix) {
        match classified.block {
            Some(Block::Method(m)) => {
                debug!("Method section {m}");
                self.method = Some(m);
                self.kind = None;
                self.in_comparison = false;
            }
            Some(Block::Comparison) => {
                debug!("Comparison section");
                self.method = Some(Method::Comparison);
                self.kind = None;
                self.in_comparison = true;
            }
            None => {}
        }

        if let (Some(method), Some(kind)) = (self.method, classified.experiment) {
            debug!("Experiment {kind} for {method}");
            self.kind = Some(kind);
            matrix.open(method, kind);
        }

        match classified.data {
            DataLine::Row(row) => {
                if let (Some(method), Some(kind)) = (self.method, self.kind) {
                    if !matrix.push(method, kind, row) {
                        trace!("No open sequence for {method}/{kind}");
                    }
                } else {
                    trace!("Row {row:?} outside of any experiment");
                }
            }
            DataLine::Malformed => trace!("Dropping malformed data line"),
            DataLine::None | DataLine::ColumnHeader => {}
        }
    }

    pub fn step(&mut self, line: &str, matrix: &mut SectionMatrix) {
        let line = line.trim();
        let classified = self.classify(line);
        self.apply(classified, matrix);
    }
}

/// Scans a whole log text. Never fails: bad lines just contribute nothing.
pub fn scan_str(text: &str) -> SectionMatrix {
    let mut state = ScanState::default();
    let mut matrix = SectionMatrix::default();
    for line in text.lines() {
        state.step(line, &mut matrix);
    }
    matrix
}

/// Reads and scans a log file. Only a missing or unreadable file is an error.
pub fn scan_file(path: &Path) -> Result<SectionMatrix> {
    let text = read_input(path)?;
    let matrix = scan_str(&text);
    debug!(
        "Scanned {} rows from {}",
        matrix.row_count(),
        path.display()
    );
    Ok(matrix)
}
