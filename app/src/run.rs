use std::path::PathBuf;

use common::{
    config::Settings,
    error::InputError,
    plot::{ChartOutcome, ChartRenderer, Part, Plot, PlotContext, ensure_dirs},
};
use console::style;
use eyre::Result;
use tracing::{error, warn};

const RULE_WIDTH: usize = 50;

/// One console line of the report.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Generated(String),
    Failed(String),
}

impl Status {
    fn print(&self) {
        match self {
            Status::Generated(msg) => println!("{} {msg}", style("✓").green()),
            Status::Failed(msg) => println!("{} {}", style("✗").red(), style(msg).red()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    pub lines: Vec<Status>,
}

impl Summary {
    pub fn generated(&self) -> usize {
        self.lines
            .iter()
            .filter(|s| matches!(s, Status::Generated(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.lines.len() - self.generated()
    }

    fn push(&mut self, status: Status) {
        status.print();
        self.lines.push(status);
    }
}

fn banner(title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}");
    println!("{}", style(title).bold());
    println!("{rule}\n");
}

/// Console lines for the result of one plot.
fn statuses(plot: &dyn Plot, result: Result<Vec<ChartOutcome>>) -> Vec<Status> {
    match result {
        Ok(outcomes) => outcomes
            .into_iter()
            .map(|outcome| match outcome {
                ChartOutcome::Generated(path) => {
                    let file = path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    Status::Generated(format!("Generated: {file}"))
                }
                ChartOutcome::Skipped { chart, reason } => {
                    Status::Failed(format!("Skipped {chart}: {reason}"))
                }
            })
            .collect(),
        Err(err) => match err.downcast_ref::<InputError>() {
            Some(InputError::Missing(path)) => {
                warn!("{}: missing input {}", plot.name(), path.display());
                vec![Status::Failed(plot.part().missing_message(path))]
            }
            Some(InputError::Empty(_)) => vec![Status::Failed(err.to_string())],
            _ => {
                error!("{} failed: {err:?}", plot.name());
                let msg = format!("Error plotting {}: {err}", plot.name());
                vec![Status::Failed(msg)]
            }
        },
    }
}

/// Runs every plot, one part at a time, and prints a line per chart. A
/// failing plot never stops the others.
pub fn run_plots(
    plots: &[Box<dyn Plot>],
    settings: &Settings,
    input: Option<PathBuf>,
    renderer: &dyn ChartRenderer,
) -> Result<Summary> {
    banner("BST and OS-Tree Graph Generation");
    ensure_dirs(&[settings.graphs_dir.clone(), settings.data_dir.clone()])?;

    let mut summary = Summary::default();
    for part in [Part::Bst, Part::OsTree] {
        let selected = plots
            .iter()
            .filter(|p| p.part() == part)
            .collect::<Vec<_>>();
        if selected.is_empty() {
            continue;
        }
        println!("\n{}", style(part.title()).bold());
        println!("{}", "-".repeat(30));

        for plot in selected {
            let ctx = PlotContext::new(settings).with_input(input.clone());
            let result = plot.plot(&ctx, renderer);
            for status in statuses(plot.as_ref(), result) {
                summary.push(status);
            }
        }
    }

    banner("Graph generation complete!");
    println!(
        "{} charts generated, {} skipped",
        summary.generated(),
        summary.failed()
    );
    println!(
        "Check the '{}' directory for output files",
        settings.graphs_dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::plot::Chart;
    use eyre::bail;

    use super::*;

    struct Noop;

    impl ChartRenderer for Noop {
        fn render(&self, _chart: &Chart) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Broken;

    #[typetag::serde]
    impl Plot for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn group(&self) -> common::plot::PlotGroup {
            common::plot::PlotGroup::Csv
        }

        fn plot(
            &self,
            _ctx: &PlotContext<'_>,
            _renderer: &dyn ChartRenderer,
        ) -> Result<Vec<ChartOutcome>> {
            bail!("bad header")
        }
    }

    fn settings(dir: &tempfile::TempDir) -> Settings {
        Settings {
            data_dir: dir.path().join("data"),
            graphs_dir: dir.path().join("graphs"),
            bst_log: dir.path().join("data/bst_results.csv"),
            os_log: dir.path().join("data/os_results.csv"),
            ..Default::default()
        }
    }

    #[test]
    fn missing_inputs_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let plots = default_plots::default_plots();

        let summary = run_plots(&plots, &settings, None, &Noop).unwrap();
        assert_eq!(summary.generated(), 0);
        assert_eq!(summary.failed(), plots.len());
        assert!(dir.path().join("graphs").is_dir());
        let first = "Cannot find bst_heights.csv - run BST experiments first";
        assert_eq!(summary.lines[0], Status::Failed(first.to_owned()));
        let last = "OS-Tree data not found - run OS-Tree experiments first";
        assert_eq!(summary.lines.last(), Some(&Status::Failed(last.to_owned())));
    }

    #[test]
    fn generated_and_broken_plots() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        fs::create_dir_all(&settings.data_dir).unwrap();
        fs::write(
            settings.data_dir.join("os_operations.csv"),
            "size,select_avg_time,rank_avg_time\n100,0.5,0.4\n",
        )
        .unwrap();

        let plots: Vec<Box<dyn Plot>> = vec![Box::new(Broken), os_operations()];
        let summary = run_plots(&plots, &settings, None, &Noop).unwrap();
        assert_eq!(
            summary.lines,
            vec![
                Status::Failed("Error plotting broken: bad header".to_owned()),
                Status::Generated("Generated: os_operations.png".to_owned()),
            ]
        );
    }

    fn os_operations() -> Box<dyn Plot> {
        default_plots::default_plots()
            .into_iter()
            .find(|p| p.name() == "OS operations")
            .unwrap()
    }

    #[test]
    fn empty_log_message() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        fs::create_dir_all(&settings.data_dir).unwrap();
        fs::write(&settings.bst_log, "no data here\n").unwrap();

        let plot = default_plots::default_plots()
            .into_iter()
            .find(|p| p.group() == common::plot::PlotGroup::Log)
            .unwrap();
        let summary = run_plots(&[plot], &settings, None, &Noop).unwrap();
        assert_eq!(
            summary.lines,
            vec![Status::Failed(format!(
                "No experiment data found in {}",
                settings.bst_log.display()
            ))]
        );
    }
}
