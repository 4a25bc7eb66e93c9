use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Classified failures of an experiment input file. Everything finer grained
/// than this (bad rows, odd shapes) is dropped silently by the parsers.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot find {}", .0.display())]
    Missing(PathBuf),
    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Missing column {column} in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("No experiment data found in {}", .0.display())]
    Empty(PathBuf),
}

impl InputError {
    /// Maps an io error from opening `path` onto the input taxonomy.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            InputError::Missing(path.to_path_buf())
        } else {
            InputError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, InputError::Missing(_))
    }
}

/// Reads a whole input file, classifying the failure.
pub fn read_input(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::from_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_missing() {
        let err = read_input(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "Cannot find definitely/not/here.csv");
    }

    #[test]
    fn other_io_errors_are_unreadable() {
        let err = InputError::from_io(
            Path::new("x.csv"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_missing());
        assert!(matches!(err, InputError::Unreadable { .. }));
    }
}
