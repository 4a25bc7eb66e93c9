use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One parsed data line: tree size first, then the measured values.
pub type Row = Vec<f64>;

/// Construction order of the keys inserted into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    NoShuffle,
    FisherYates,
    RandomizeInPlace,
    PermuteBySorting,
    /// Pseudo-method for the section reporting all four methods side by side.
    Comparison,
}

impl Method {
    /// The real methods, in the column order used by comparison rows.
    pub const SHUFFLES: [Method; 4] = [
        Method::NoShuffle,
        Method::FisherYates,
        Method::RandomizeInPlace,
        Method::PermuteBySorting,
    ];

    /// Substring identifying this method in a log header.
    pub fn marker(&self) -> &'static str {
        match self {
            Method::NoShuffle => "NoShuffle",
            Method::FisherYates => "FisherYates",
            Method::RandomizeInPlace => "RandomizeInPlace",
            Method::PermuteBySorting => "PermuteBySorting",
            Method::Comparison => "Comparison",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Method::NoShuffle => "No Shuffle",
            Method::FisherYates => "Fisher-Yates",
            Method::RandomizeInPlace => "RANDOMIZE-IN-PLACE",
            Method::PermuteBySorting => "PERMUTE-BY-SORTING",
            Method::Comparison => "Comparison",
        }
    }

    /// Snake case key, used for output file names.
    pub fn key(&self) -> &'static str {
        match self {
            Method::NoShuffle => "no_shuffle",
            Method::FisherYates => "fisher_yates",
            Method::RandomizeInPlace => "randomize_in_place",
            Method::PermuteBySorting => "permute_by_sorting",
            Method::Comparison => "comparison",
        }
    }

    /// Column of this method inside a comparison row, counting after `n`.
    pub fn position(&self) -> Option<usize> {
        Method::SHUFFLES.iter().position(|m| m == self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// The metric a block of rows measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    Height,
    Build,
    Destroy,
    Inorder,
    HeightComp,
    BuildComp,
    DestroyComp,
    InorderComp,
}

impl ExperimentKind {
    pub const COMPARISON: [ExperimentKind; 4] = [
        ExperimentKind::HeightComp,
        ExperimentKind::BuildComp,
        ExperimentKind::DestroyComp,
        ExperimentKind::InorderComp,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ExperimentKind::Height => "height",
            ExperimentKind::Build => "build",
            ExperimentKind::Destroy => "destroy",
            ExperimentKind::Inorder => "inorder",
            ExperimentKind::HeightComp => "height_comp",
            ExperimentKind::BuildComp => "build_comp",
            ExperimentKind::DestroyComp => "destroy_comp",
            ExperimentKind::InorderComp => "inorder_comp",
        }
    }

    pub fn is_comparison(&self) -> bool {
        ExperimentKind::COMPARISON.contains(self)
    }

    /// The single-method kind measuring the same metric.
    pub fn base(&self) -> ExperimentKind {
        match self {
            ExperimentKind::HeightComp => ExperimentKind::Height,
            ExperimentKind::BuildComp => ExperimentKind::Build,
            ExperimentKind::DestroyComp => ExperimentKind::Destroy,
            ExperimentKind::InorderComp => ExperimentKind::Inorder,
            single => *single,
        }
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parsed measurements of one log file: method -> experiment kind -> rows.
///
/// Both levels keep first-encounter order and rows keep log order. Only the
/// scanner builds it; everything else reads.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionMatrix {
    sections: IndexMap<Method, IndexMap<ExperimentKind, Vec<Row>>>,
}

impl SectionMatrix {
    /// Makes sure a row sequence exists for `(method, kind)`.
    pub(crate) fn open(&mut self, method: Method, kind: ExperimentKind) {
        self.sections
            .entry(method)
            .or_default()
            .entry(kind)
            .or_default();
    }

    /// Appends to an opened sequence. Returns false if it was never opened.
    pub(crate) fn push(&mut self, method: Method, kind: ExperimentKind, row: Row) -> bool {
        match self
            .sections
            .get_mut(&method)
            .and_then(|kinds| kinds.get_mut(&kind))
        {
            Some(rows) => {
                rows.push(row);
                true
            }
            None => false,
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.sections.keys().copied()
    }

    pub fn kinds(&self, method: Method) -> impl Iterator<Item = ExperimentKind> + '_ {
        self.sections
            .get(&method)
            .into_iter()
            .flat_map(|kinds| kinds.keys().copied())
    }

    pub fn rows(&self, method: Method, kind: ExperimentKind) -> Option<&[Row]> {
        self.sections
            .get(&method)
            .and_then(|kinds| kinds.get(&kind))
            .map(Vec::as_slice)
    }

    /// Total number of rows across every sequence.
    pub fn row_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|kinds| kinds.values())
            .map(Vec::len)
            .sum()
    }

    /// True when no sequence holds a single row.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
