use core::fmt::{self, Debug};
use std::{
    fs,
    path::{Path, PathBuf},
};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;

/// Which input a plot reads, used to pick plots per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotGroup {
    /// Plain CSV tables under the data directory.
    Csv,
    /// The mixed BST section log.
    Log,
    /// The `=== Experiment N ===` OS-Tree log.
    Os,
}

impl fmt::Display for PlotGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlotGroup::Csv => "csv",
            PlotGroup::Log => "log",
            PlotGroup::Os => "os",
        })
    }
}

/// Report section a plot is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Part {
    Bst,
    OsTree,
}

impl Part {
    pub fn title(&self) -> &'static str {
        match self {
            Part::Bst => "Part A: BST Graphs",
            Part::OsTree => "Part B: OS-Tree Graphs",
        }
    }

    /// Diagnostic printed when a plot's input file does not exist.
    pub fn missing_message(&self, path: &Path) -> String {
        match self {
            Part::Bst => {
                let file = path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("Cannot find {file} - run BST experiments first")
            }
            Part::OsTree => "OS-Tree data not found - run OS-Tree experiments first".to_owned(),
        }
    }
}

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Human readable name, used in diagnostics
    fn name(&self) -> &'static str;
    fn group(&self) -> PlotGroup;
    fn part(&self) -> Part {
        Part::Bst
    }
    /// Reads this plot's input and renders its charts.
    ///
    /// An `Err` skips the whole plot (typically a missing input). Plots that
    /// produce several charts report each one through its [`ChartOutcome`],
    /// so one broken chart does not hide the others.
    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>>;
}
clone_trait_object!(Plot);

/// Inputs shared by every plot of a run.
#[derive(Debug, Clone)]
pub struct PlotContext<'a> {
    pub settings: &'a Settings,
    /// Replaces the plot's default input file when set.
    pub input: Option<PathBuf>,
}

impl<'a> PlotContext<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            input: None,
        }
    }

    pub fn with_input(mut self, input: Option<PathBuf>) -> Self {
        self.input = input;
        self
    }

    /// The override if any, else `default`.
    pub fn input_or(&self, default: &Path) -> PathBuf {
        self.input.clone().unwrap_or_else(|| default.to_path_buf())
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.settings.data_dir.join(name)
    }

    pub fn graph_file(&self, name: &str) -> PathBuf {
        self.settings.graphs_dir.join(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Generated(PathBuf),
    Skipped { chart: String, reason: String },
}

impl ChartOutcome {
    pub fn skipped(chart: impl Into<String>, reason: impl Into<String>) -> Self {
        ChartOutcome::Skipped {
            chart: chart.into(),
            reason: reason.into(),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ChartOutcome::Generated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    /// Measured data, drawn with markers.
    Measured,
    /// Theoretical overlay, drawn as a plain line.
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub kind: SeriesKind,
}

impl Series {
    pub fn measured(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            kind: SeriesKind::Measured,
        }
    }

    pub fn reference(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            kind: SeriesKind::Reference,
        }
    }
}

/// One set of axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub log_x: bool,
    pub log_y: bool,
    pub series: Vec<Series>,
}

impl Panel {
    /// A panel over tree size, with a logarithmic x axis.
    pub fn over_size(title: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: "Number of Nodes (n)".to_owned(),
            y_label: y_label.into(),
            log_x: true,
            log_y: false,
            series: Vec::new(),
        }
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn log_y(mut self) -> Self {
        self.log_y = true;
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn has_data(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.kind == SeriesKind::Measured && !s.points.is_empty())
    }
}

/// A chart artifact: one or more panels written to `filepath`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub filepath: PathBuf,
    pub panels: Vec<Panel>,
}

impl Chart {
    pub fn new(filepath: PathBuf) -> Self {
        Self {
            filepath,
            panels: Vec::new(),
        }
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn file_name(&self) -> String {
        self.filepath
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filepath.display().to_string())
    }
}

/// Draws charts to image files. Any backend that can draw labelled line
/// series with optional logarithmic axes will do.
pub trait ChartRenderer {
    fn render(&self, chart: &Chart) -> Result<()>;
}

/// Renders one chart, turning a failure into a skipped outcome.
pub fn render_chart(renderer: &dyn ChartRenderer, chart: &Chart) -> ChartOutcome {
    if !chart.panels.iter().any(Panel::has_data) {
        return ChartOutcome::skipped(chart.file_name(), "no data points");
    }
    match renderer.render(chart) {
        Ok(()) => {
            debug!("Rendered {}", chart.filepath.display());
            ChartOutcome::Generated(chart.filepath.clone())
        }
        Err(err) => {
            warn!("Rendering {} failed: {err:#}", chart.filepath.display());
            ChartOutcome::skipped(chart.file_name(), format!("{err:#}"))
        }
    }
}

pub fn ensure_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        fs::create_dir_all(dir).with_context(|| format!("Create {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use eyre::bail;

    use super::*;

    #[derive(Default)]
    struct Flaky {
        rendered: RefCell<Vec<PathBuf>>,
    }

    impl ChartRenderer for Flaky {
        fn render(&self, chart: &Chart) -> Result<()> {
            if chart.file_name().starts_with("bad") {
                bail!("backend exploded");
            }
            self.rendered.borrow_mut().push(chart.filepath.clone());
            Ok(())
        }
    }

    fn chart(name: &str, points: Vec<(f64, f64)>) -> Chart {
        let panel = Panel::over_size("t", "y").series(Series::measured("s", points));
        Chart::new(PathBuf::from("graphs").join(name)).panel(panel)
    }

    #[test]
    fn failures_become_skips() {
        let renderer = Flaky::default();
        let ok = render_chart(&renderer, &chart("good.png", vec![(1.0, 1.0)]));
        let bad = render_chart(&renderer, &chart("bad.png", vec![(1.0, 1.0)]));
        let good = PathBuf::from("graphs/good.png");
        assert_eq!(ok, ChartOutcome::Generated(good));
        assert_eq!(bad, ChartOutcome::skipped("bad.png", "backend exploded"));
        assert_eq!(renderer.rendered.borrow().len(), 1);
    }

    #[test]
    fn reference_only_chart_is_skipped() {
        let renderer = Flaky::default();
        let panel = Panel::over_size("t", "y")
            .series(Series::measured("s", Vec::new()))
            .series(Series::reference("log2(n)", vec![(2.0, 1.0)]));
        let chart = Chart::new(PathBuf::from("empty.png")).panel(panel);
        assert!(!render_chart(&renderer, &chart).is_generated());
        assert!(renderer.rendered.borrow().is_empty());
    }

    #[test]
    fn context_paths() {
        let settings = Settings::default();
        let ctx = PlotContext::new(&settings);
        assert_eq!(ctx.data_file("a.csv"), PathBuf::from("data/a.csv"));
        assert_eq!(ctx.graph_file("a.png"), PathBuf::from("graphs/a.png"));
        assert_eq!(ctx.input_or(&settings.bst_log), settings.bst_log);

        let ctx = ctx.with_input(Some(PathBuf::from("other.log")));
        assert_eq!(ctx.input_or(&settings.bst_log), PathBuf::from("other.log"));
    }

    #[test]
    fn missing_messages() {
        assert_eq!(
            Part::Bst.missing_message(Path::new("data/bst_heights.csv")),
            "Cannot find bst_heights.csv - run BST experiments first"
        );
        assert_eq!(
            Part::OsTree.missing_message(Path::new("data/os_operations.csv")),
            "OS-Tree data not found - run OS-Tree experiments first"
        );
    }
}
