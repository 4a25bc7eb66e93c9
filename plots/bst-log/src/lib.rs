use common::{
    error::InputError,
    matrix::{ExperimentKind, Method, SectionMatrix},
    plot::{
        Chart, ChartOutcome, ChartRenderer, Panel, Plot, PlotContext, PlotGroup, Series,
        render_chart,
    },
    reconcile::{Canonical, method_series, reconcile, sorted_by_n},
    scan::scan_file,
    stats::{self, Improvement, improvement_ratios, reference},
};
use eyre::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Harness times are milliseconds.
const MS_TO_US: f64 = 1e3;

/// Per-method and comparison charts from the mixed BST section log.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BstLog;

#[typetag::serde]
impl Plot for BstLog {
    fn name(&self) -> &'static str {
        "BST experiment log"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Log
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let path = ctx.input_or(&ctx.settings.bst_log);
        let matrix = scan_file(&path)?;
        if matrix.is_empty() {
            return Err(InputError::Empty(path).into());
        }
        debug!(
            "{} rows over {} methods in {}",
            matrix.row_count(),
            matrix.methods().count(),
            path.display()
        );

        let mut outcomes = matrix
            .methods()
            .filter(|&m| m != Method::Comparison)
            .map(|method| render_chart(renderer, &method_chart(ctx, &matrix, method)))
            .collect::<Vec<_>>();

        if matrix.kinds(Method::Comparison).any(|k| k.is_comparison()) {
            outcomes.push(render_chart(renderer, &comparison_chart(ctx, &matrix)));

            let heights = canonical(&matrix, Method::Comparison, ExperimentKind::HeightComp);
            report_improvements(&improvement_ratios(&heights));
        }

        Ok(outcomes)
    }
}

fn canonical(matrix: &SectionMatrix, method: Method, kind: ExperimentKind) -> Vec<Canonical> {
    matrix
        .rows(method, kind)
        .map(|rows| reconcile(kind, rows))
        .unwrap_or_default()
}

/// Sorted `(n, value)` points of `method` for `kind`.
fn series_of(
    matrix: &SectionMatrix,
    source: Method,
    kind: ExperimentKind,
    method: Method,
) -> Vec<(f64, f64)> {
    sorted_by_n(&method_series(&canonical(matrix, source, kind), method))
}

fn sizes(points: &[(f64, f64)]) -> Vec<f64> {
    points.iter().map(|p| p.0).collect()
}

fn method_chart(ctx: &PlotContext<'_>, matrix: &SectionMatrix, method: Method) -> Chart {
    let label = method.label();
    let height = series_of(matrix, method, ExperimentKind::Height, method);
    let build = series_of(matrix, method, ExperimentKind::Build, method);
    let destroy = series_of(matrix, method, ExperimentKind::Destroy, method);
    let inorder = series_of(matrix, method, ExperimentKind::Inorder, method);

    let height_sizes = sizes(&height);
    let ratio = height
        .iter()
        .filter_map(|&(n, h)| stats::height_ratio(h, n).map(|r| (n, r)))
        .collect();
    let ratio_title = format!("{label}: Height / log₂(n)");
    let mut ratio_panel = Panel::over_size(ratio_title, "Height / log₂(n)")
        .series(Series::measured("Height / log₂(n)", ratio));
    ratio_panel = if method == Method::NoShuffle {
        ratio_panel.series(Series::reference(
            "n / log₂(n)",
            reference::n_over_log2_n(&height_sizes),
        ))
    } else {
        ratio_panel.series(Series::reference(
            "Ratio = 1",
            reference::constant(&height_sizes, 1.0),
        ))
    };

    let per_node = inorder
        .iter()
        .map(|&(n, total)| (n, stats::per_operation(total, n) * MS_TO_US))
        .collect();

    Chart::new(ctx.graph_file(&format!("bst_{}.png", method.key())))
        .panel(
            Panel::over_size(format!("{label}: Tree Height"), "Tree Height")
                .series(Series::measured("Average Height", height))
                .series(Series::reference("log₂(n)", reference::log2(&height_sizes))),
        )
        .panel(ratio_panel)
        .panel(
            Panel::over_size(format!("{label}: Build Time"), "Build Time (ms)")
                .log_y()
                .series(Series::measured("Build Time", build)),
        )
        .panel(
            Panel::over_size(format!("{label}: Destroy Time"), "Destroy Time (ms)")
                .log_y()
                .series(Series::measured("Destroy Time", destroy)),
        )
        .panel(
            Panel::over_size(format!("{label}: Inorder Walk"), "Total Walk Time (ms)")
                .log_y()
                .series(Series::measured("Total Walk Time", inorder)),
        )
        .panel(
            Panel::over_size(format!("{label}: Walk Time per Node"), "Time per Node (μs)")
                .series(Series::measured("Time per Node", per_node)),
        )
}

/// Panel title and y label for a metric.
fn metric(kind: ExperimentKind) -> (&'static str, &'static str) {
    match kind.base() {
        ExperimentKind::Height => ("Height Comparison", "Tree Height"),
        ExperimentKind::Build => ("Build Time Comparison", "Build Time (ms)"),
        ExperimentKind::Destroy => ("Destroy Time Comparison", "Destroy Time (ms)"),
        _ => ("Inorder Walk Comparison", "Total Walk Time (ms)"),
    }
}

fn comparison_chart(ctx: &PlotContext<'_>, matrix: &SectionMatrix) -> Chart {
    ExperimentKind::COMPARISON.into_iter().fold(
        Chart::new(ctx.graph_file("bst_comparison.png")),
        |chart, kind| {
            let (title, y_label) = metric(kind);
            let panel = Method::SHUFFLES.iter().fold(
                Panel::over_size(title, y_label).log_y(),
                |panel, &method| {
                    panel.series(Series::measured(
                        method.label(),
                        series_of(matrix, Method::Comparison, kind, method),
                    ))
                },
            );
            chart.panel(panel)
        },
    )
}

fn report_improvements(ratios: &[Improvement]) {
    let Some(first) = ratios.first() else {
        return;
    };
    println!(
        "Height improvement over {} at n={}:",
        Method::NoShuffle.label(),
        first.n
    );
    for Improvement { method, ratio, .. } in ratios {
        println!("  {}: {ratio:.2}x better", method.label());
    }
    info!(
        "Improvement ratios at n={}: {}",
        first.n,
        ratios
            .iter()
            .map(|i| format!("{}={:.2}", i.method.key(), i.ratio))
            .join(", ")
    );
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs, path::PathBuf};

    use common::{config::Settings, plot::SeriesKind};

    use super::*;

    const LOG: &str = "\
=== NoShuffle: Height Experiment ===
n,avg_height
100,99.00
1000,999.00

=== NoShuffle: Inorder Walk Experiment ===
n,total_time_ms,time_per_node_ms
100,0.001000,0.00001000
10,0.000100,0.00001000

=== FisherYates: Build Time Experiment ===
n,avg_time_ms
1000,0.1500

=== COMPARISON: All Four Methods ===

=== Height Comparison ===
n,no_shuffle,fisher_yates,randomize_inplace,permute_sort
100,99.00,12.50,12.40,12.60
1000,999.00,21.40,21.10,21.50
";

    #[derive(Default)]
    struct Recorder {
        charts: RefCell<Vec<Chart>>,
    }

    impl ChartRenderer for Recorder {
        fn render(&self, chart: &Chart) -> Result<()> {
            self.charts.borrow_mut().push(chart.clone());
            Ok(())
        }
    }

    fn setup(log: &str) -> (tempfile::TempDir, Settings) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            graphs_dir: dir.path().join("graphs"),
            bst_log: dir.path().join("bst_results.csv"),
            ..Default::default()
        };
        fs::write(&settings.bst_log, log).unwrap();
        (dir, settings)
    }

    #[test]
    fn one_chart_per_method_and_comparison() {
        let (dir, settings) = setup(LOG);
        let recorder = Recorder::default();
        let outcomes = BstLog
            .plot(&PlotContext::new(&settings), &recorder)
            .unwrap();

        let graphs = dir.path().join("graphs");
        assert_eq!(
            outcomes,
            vec![
                ChartOutcome::Generated(graphs.join("bst_no_shuffle.png")),
                ChartOutcome::Generated(graphs.join("bst_fisher_yates.png")),
                ChartOutcome::Generated(graphs.join("bst_comparison.png")),
            ]
        );

        let charts = recorder.charts.borrow();
        let no_shuffle = &charts[0];
        assert_eq!(no_shuffle.panels.len(), 6);
        // Inorder rows are charted in size order.
        assert_eq!(
            no_shuffle.panels[4].series[0].points,
            vec![(10.0, 0.0001), (100.0, 0.001)]
        );
        let ratio = &no_shuffle.panels[1].series[1];
        assert_eq!(ratio.kind, SeriesKind::Reference);
        assert_eq!(ratio.label, "n / log₂(n)");

        let comparison = &charts[2];
        let heights = &comparison.panels[0].series;
        assert_eq!(heights.len(), 4);
        assert_eq!(heights[2].label, Method::RandomizeInPlace.label());
        assert_eq!(heights[2].points, vec![(100.0, 12.4), (1000.0, 21.1)]);
    }

    #[test]
    fn input_override() {
        let (dir, settings) = setup("");
        let other = dir.path().join("other.log");
        fs::write(&other, "FisherYates:\nHeight Experiment\n100,6.8\n").unwrap();

        let ctx = PlotContext::new(&settings).with_input(Some(other));
        let outcomes = BstLog.plot(&ctx, &Recorder::default()).unwrap();
        assert_eq!(
            outcomes,
            vec![ChartOutcome::Generated(
                dir.path().join("graphs/bst_fisher_yates.png")
            )]
        );
    }

    #[test]
    fn empty_log_reports_no_data() {
        let (_dir, settings) = setup("Nothing to see here\n");
        let err = BstLog
            .plot(&PlotContext::new(&settings), &Recorder::default())
            .unwrap_err();
        let input = err.downcast_ref::<InputError>().unwrap();
        let InputError::Empty(path) = input else {
            panic!("expected an empty log, got {input:?}");
        };
        assert_eq!(path, &settings.bst_log);
        assert!(input.to_string().starts_with("No experiment data found in"));
    }

    #[test]
    fn missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            bst_log: PathBuf::from(dir.path().join("absent.csv")),
            ..Default::default()
        };
        let err = BstLog
            .plot(&PlotContext::new(&settings), &Recorder::default())
            .unwrap_err();
        assert!(
            err.downcast_ref::<InputError>()
                .is_some_and(InputError::is_missing)
        );
    }
}
