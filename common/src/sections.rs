//! Parser for logs split into `=== Experiment N: <name> ===` sections, as
//! written by the order-statistic tree harness.

use std::{collections::BTreeMap, path::Path, sync::LazyLock};

use eyre::Result;
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::read_input;

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^===(?P<name>.*?)(?:===|$)").expect("valid regex"));

/// Values per tree size, ascending by size.
pub type SizeTable = BTreeMap<u64, Vec<f64>>;

/// Raw data lines of every section, in first-encounter order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionLog {
    sections: IndexMap<String, Vec<String>>,
}

impl SectionLog {
    pub fn parse(text: &str) -> Self {
        let mut sections: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current: Option<String> = None;

        for line in text.lines().map(str::trim) {
            if let Some(caps) = SECTION_HEADER.captures(line) {
                let name = caps["name"].trim().to_owned();
                debug!("Section {name:?}");
                // Reopening a section starts it over.
                sections.insert(name.clone(), Vec::new());
                current = Some(name);
                continue;
            }
            if line.is_empty() || line.starts_with("Experiment") || line.starts_with("n,") {
                continue;
            }
            let Some(name) = current.as_deref().filter(|name| !name.is_empty()) else {
                continue;
            };
            if is_data_line(line) {
                if let Some(rows) = sections.get_mut(name) {
                    rows.push(line.to_owned());
                }
            } else {
                trace!("Skipping {line:?} in {name:?}");
            }
        }

        Self { sections }
    }

    pub fn parse_file(path: &Path) -> Result<Self> {
        Ok(Self::parse(&read_input(path)?))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// A section with at least one data line.
    pub fn section(&self, name: &str) -> Option<Section<'_>> {
        let (name, lines) = self.sections.get_key_value(name)?;
        (!lines.is_empty()).then_some(Section { name, lines })
    }
}

fn is_data_line(line: &str) -> bool {
    let mut parts = line.split(',');
    let first = parts.next().unwrap_or_default();
    parts.next().is_some() && !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub name: &'a str,
    pub lines: &'a [String],
}

impl Section<'_> {
    /// Groups rows of three or more fields by size. Later rows for a size
    /// are appended to its bucket, so the first row supplies columns 0..
    pub fn by_size(&self) -> SizeTable {
        let mut table = SizeTable::new();
        for line in self.lines {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                continue;
            }
            let Ok(n) = parts[0].parse::<u64>() else {
                continue;
            };
            let values: Option<Vec<f64>> = parts[1..].iter().map(|p| p.parse().ok()).collect();
            match values {
                Some(values) => table.entry(n).or_default().extend(values),
                None => trace!("Skipping unparseable row {line:?}"),
            }
        }
        table
    }
}

/// `(n, bucket[column])` for every size whose bucket reaches `column`.
pub fn size_column(table: &SizeTable, column: usize) -> Vec<(f64, f64)> {
    table
        .iter()
        .filter_map(|(&n, values)| values.get(column).map(|&v| (n as f64, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Order-Statistic Tree Experiments (Part B)
==========================================
Comparing OS-Tree vs BST performance

=== Experiment 1: INSERT Time Comparison (OS-Tree vs BST) ===
n,bst_time_ms,os_tree_time_ms,overhead_ratio
1000,0.1000,0.1200,1.200
100,0.0100,0.0130,1.300
Progress: 50%, almost there
=== Experiment 3: OS-SELECT Runtime ===
n,avg_time_ms,time_per_operation_us
100,0.5,0.25
100,0.7,0.35
abc,1,2
";

    #[test]
    fn collects_rows_per_section() {
        let log = SectionLog::parse(LOG);
        let names: Vec<_> = log.names().collect();
        assert_eq!(
            names,
            vec![
                "",
                "Experiment 1: INSERT Time Comparison (OS-Tree vs BST)",
                "Experiment 3: OS-SELECT Runtime"
            ]
        );

        let insert = log
            .section("Experiment 1: INSERT Time Comparison (OS-Tree vs BST)")
            .unwrap();
        assert_eq!(insert.lines.len(), 2);
        assert!(log.section("").is_none());
        let delete = "Experiment 2: DELETE Time Comparison (OS-Tree vs BST)";
        assert!(log.section(delete).is_none());
    }

    #[test]
    fn sizes_are_sorted_and_buckets_extend() {
        let log = SectionLog::parse(LOG);
        let insert = log
            .section("Experiment 1: INSERT Time Comparison (OS-Tree vs BST)")
            .unwrap()
            .by_size();
        assert_eq!(insert.keys().copied().collect::<Vec<_>>(), vec![100, 1000]);
        assert_eq!(size_column(&insert, 2), vec![(100.0, 1.3), (1000.0, 1.2)]);

        let select = log
            .section("Experiment 3: OS-SELECT Runtime")
            .unwrap()
            .by_size();
        assert_eq!(select[&100], vec![0.5, 0.25, 0.7, 0.35]);
        assert_eq!(size_column(&select, 1), vec![(100.0, 0.25)]);
    }

    #[test]
    fn reopened_section_starts_over() {
        let log = SectionLog::parse("=== A ===\n1,2,3\n=== A ===\n4,5,6\n");
        assert_eq!(log.section("A").unwrap().lines, ["4,5,6".to_owned()]);
    }

    #[test]
    fn data_line_needs_digit_prefix() {
        assert!(is_data_line("10,1"));
        assert!(!is_data_line("10"));
        assert!(!is_data_line("1.5,1"));
        assert!(!is_data_line(",1"));
        assert!(!is_data_line("x10,1"));
    }
}
