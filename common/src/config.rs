use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::plot::Plot;

/// Optional YAML configuration. Every field has a default, so an absent
/// file and an empty file behave the same.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    /// Plots to run, in order. `None` runs the default catalogue.
    pub plots: Option<Vec<Box<dyn Plot>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the plain CSV inputs.
    pub data_dir: PathBuf,
    /// Output directory for images, created if absent.
    pub graphs_dir: PathBuf,
    /// Mixed section log of the BST harness.
    pub bst_log: PathBuf,
    /// `=== Experiment N ===` log of the OS-Tree harness.
    pub os_log: PathBuf,
    /// Image width in pixels.
    pub width: u32,
    /// Height of one row of panels in pixels.
    pub height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            graphs_dir: PathBuf::from("graphs"),
            bst_log: PathBuf::from("data/bst_results.csv"),
            os_log: PathBuf::from("data/os_results.csv"),
            width: 1400,
            height: 600,
        }
    }
}
