use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use indexmap::IndexMap;

use crate::error::{InputError, read_input};

/// A headed, all-numeric CSV file held as named columns in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    path: PathBuf,
    columns: IndexMap<String, Vec<f64>>,
}

impl Table {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = read_input(path)?;
        Self::parse(path, &text)
    }

    /// `path` is only used for error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .with_context(|| format!("Read header of {}", path.display()))?
            .clone();
        let mut columns: IndexMap<String, Vec<f64>> = headers
            .iter()
            .map(|h| (h.to_owned(), Vec::new()))
            .collect();

        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Read {}", path.display()))?;
            for (header, cell) in headers.iter().zip(record.iter()) {
                let value = cell.parse::<f64>().map_err(|_| {
                    eyre!(
                        "Non-numeric {header} value {cell:?} on line {} of {}",
                        idx + 2,
                        path.display()
                    )
                })?;
                if let Some(column) = columns.get_mut(header) {
                    column.push(value);
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
        })
    }

    pub fn column(&self, name: &str) -> Result<&[f64], InputError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| InputError::MissingColumn {
                path: self.path.clone(),
                column: name.to_owned(),
            })
    }

    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(x, y)` pairs of two columns.
    pub fn points(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>, InputError> {
        let xs = self.column(x)?;
        let ys = self.column(y)?;
        Ok(xs.iter().copied().zip(ys.iter().copied()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_columns_in_file_order() {
        let table = Table::parse(
            Path::new("bst_heights.csv"),
            "size,avg_height,min_height,max_height\n1000,21.5,19,25\n100, 12.1, 10, 15\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("size").unwrap(), &[1000.0, 100.0]);
        assert_eq!(
            table.points("size", "max_height").unwrap(),
            vec![(1000.0, 25.0), (100.0, 15.0)]
        );
    }

    #[test]
    fn missing_column_is_named() {
        let table = Table::parse(Path::new("t.csv"), "size,avg_walk_time\n10,0.1\n").unwrap();
        let err = table.column("select_avg_time").unwrap_err();
        assert_eq!(err.to_string(), "Missing column select_avg_time in t.csv");
    }

    #[test]
    fn non_numeric_cell_is_an_error() {
        let err = Table::parse(Path::new("t.csv"), "size,avg\n10,fast\n").unwrap_err();
        assert!(err.to_string().contains("Non-numeric avg"));
    }

    #[test]
    fn header_only_is_empty() {
        let table = Table::parse(Path::new("t.csv"), "size,avg\n").unwrap();
        assert!(table.is_empty());
    }
}
