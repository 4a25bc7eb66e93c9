//! Charts over the plain CSV tables written by the BST and OS-Tree harnesses.

use common::{
    S_TO_NS, S_TO_US,
    plot::{
        Chart, ChartOutcome, ChartRenderer, Panel, Part, Plot, PlotContext, PlotGroup, Series,
        render_chart,
    },
    stats::{self, reference},
    table::Table,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Expected height of a random BST is about `2.99 * log2(n)`.
const RANDOM_HEIGHT_FACTOR: f64 = 2.99;
const BUILD_REFERENCE_SCALE: f64 = 1e-7;
const WALK_REFERENCE_SCALE: f64 = 1e-8;

const BUILD_TITLE: &str = "BST Build Time (Cumulative Insertions)";
const DELETE_TITLE: &str = "BST Destruction Time (Delete Root Repeatedly)";
const PER_NODE_LABEL: &str = "Time per Node (nanoseconds)";
const OPERATIONS_TITLE: &str = "OS-Select and OS-Rank Performance";

fn read(ctx: &PlotContext<'_>, file: &str) -> Result<Table> {
    let path = ctx.data_file(file);
    debug!("Reading {}", path.display());
    Table::from_path(&path)
}

fn render(renderer: &dyn ChartRenderer, chart: Chart) -> Vec<ChartOutcome> {
    vec![render_chart(renderer, &chart)]
}

/// Sizes and `per(y, n) * scale` for every row.
fn per_node(points: &[(f64, f64)], scale: f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(n, y)| (n, stats::per_operation(y, n) * scale))
        .collect()
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BstHeights;

#[typetag::serde]
impl Plot for BstHeights {
    fn name(&self) -> &'static str {
        "BST heights"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let table = read(ctx, "bst_heights.csv")?;
        let sizes = table.column("size")?;
        let avg = table.points("size", "avg_height")?;
        let min = table.points("size", "min_height")?;
        let max = table.points("size", "max_height")?;

        let ratio = avg
            .iter()
            .filter_map(|&(n, h)| stats::height_ratio(h, n).map(|r| (n, r)))
            .collect();
        let random = reference::scaled_log2(sizes, RANDOM_HEIGHT_FACTOR);
        let unit = reference::constant(sizes, 1.0);
        let theory = reference::constant(sizes, RANDOM_HEIGHT_FACTOR);

        let chart = Chart::new(ctx.graph_file("bst_heights.png"))
            .panel(
                Panel::over_size("BST Height vs Tree Size", "Tree Height")
                    .series(Series::measured("Average Height", avg))
                    .series(Series::measured("Min Height", min))
                    .series(Series::measured("Max Height", max))
                    .series(Series::reference("log₂(n)", reference::log2(sizes)))
                    .series(Series::reference("2.99×log₂(n)", random)),
            )
            .panel(
                Panel::over_size("Height Ratio to log₂(n)", "Height / log₂(n)")
                    .series(Series::measured("Height / log₂(n)", ratio))
                    .series(Series::reference("Ratio = 1", unit))
                    .series(Series::reference("Ratio = 2.99 (theoretical)", theory)),
            );
        Ok(render(renderer, chart))
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BstBuildTimes;

#[typetag::serde]
impl Plot for BstBuildTimes {
    fn name(&self) -> &'static str {
        "BST build times"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let table = read(ctx, "bst_build_times.csv")?;
        let sizes = table.column("size")?;
        let avg = table.points("size", "avg_build_time")?;
        let min = table.points("size", "min_build_time")?;
        let max = table.points("size", "max_build_time")?;
        let per_insert = per_node(&avg, S_TO_US);
        let scaled = reference::n_log2_n(sizes, BUILD_REFERENCE_SCALE);

        let chart = Chart::new(ctx.graph_file("bst_build_times.png"))
            .panel(
                Panel::over_size(BUILD_TITLE, "Build Time (seconds)")
                    .log_y()
                    .series(Series::measured("Average Build Time", avg))
                    .series(Series::measured("Min Build Time", min))
                    .series(Series::measured("Max Build Time", max))
                    .series(Series::reference("O(n log n) scaled", scaled)),
            )
            .panel(
                Panel::over_size("Average Time per Insert Operation", "Time per Insert (μs)")
                    .series(Series::measured("Time per Insert", per_insert)),
            );
        Ok(render(renderer, chart))
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BstDeleteTimes;

#[typetag::serde]
impl Plot for BstDeleteTimes {
    fn name(&self) -> &'static str {
        "BST delete times"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let delete = read(ctx, "bst_delete_times.csv")?;
        let build = read(ctx, "bst_build_times.csv")?;
        let avg_delete = delete.points("size", "avg_delete_time")?;
        let min_delete = delete.points("size", "min_delete_time")?;
        let max_delete = delete.points("size", "max_delete_time")?;
        let avg_build = build.points("size", "avg_build_time")?;

        let chart = Chart::new(ctx.graph_file("bst_delete_times.png"))
            .panel(
                Panel::over_size(DELETE_TITLE, "Total Delete Time (seconds)")
                    .log_y()
                    .series(Series::measured("Average Delete Time", avg_delete.clone()))
                    .series(Series::measured("Min Delete Time", min_delete))
                    .series(Series::measured("Max Delete Time", max_delete)),
            )
            .panel(
                Panel::over_size("Build Time vs Delete Time Comparison", "Time (seconds)")
                    .log_y()
                    .series(Series::measured("Delete Time", avg_delete))
                    .series(Series::measured("Build Time", avg_build)),
            );
        Ok(render(renderer, chart))
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InorderWalk;

#[typetag::serde]
impl Plot for InorderWalk {
    fn name(&self) -> &'static str {
        "inorder walk times"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let table = read(ctx, "inorder_walk_times.csv")?;
        let sizes = table.column("size")?;
        let walk = table.points("size", "avg_walk_time")?;
        let scaled = reference::linear(sizes, WALK_REFERENCE_SCALE);

        let ns_per_node = per_node(&walk, S_TO_NS);
        let values = ns_per_node.iter().map(|p| p.1).collect::<Vec<_>>();
        let mut per_node_panel = Panel::over_size("Confirming Θ(n) Complexity", PER_NODE_LABEL)
            .series(Series::measured("Time per Node", ns_per_node));
        if let Some(avg) = stats::mean(&values) {
            let label = format!("Average: {avg:.1} ns/node");
            let line = Series::reference(label, reference::constant(sizes, avg));
            per_node_panel = per_node_panel.series(line);
        }

        let chart = Chart::new(ctx.graph_file("inorder_walk_times.png"))
            .panel(
                Panel::over_size("Inorder-Tree-Walk Runtime", "Walk Time (seconds)")
                    .log_y()
                    .series(Series::measured("Inorder Walk Time", walk))
                    .series(Series::reference("O(n) scaled", scaled)),
            )
            .panel(per_node_panel);
        Ok(render(renderer, chart))
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OsTreeComparison;

#[typetag::serde]
impl Plot for OsTreeComparison {
    fn name(&self) -> &'static str {
        "OS-Tree comparisons"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn part(&self) -> Part {
        Part::OsTree
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let insert = read(ctx, "os_insert_comparison.csv")?;
        let delete = read(ctx, "os_delete_comparison.csv")?;

        let chart = Chart::new(ctx.graph_file("os_tree_comparison.png"))
            .panel(versus(&insert, "Insert", "Build Time (seconds)")?)
            .panel(versus(&delete, "Delete", "Delete Time (seconds)")?);
        Ok(render(renderer, chart))
    }
}

/// BST against OS-Tree average times for one operation.
fn versus(table: &Table, op: &str, y_label: &str) -> Result<Panel> {
    let bst = table.points("size", "bst_avg_time")?;
    let os_tree = table.points("size", "os_avg_time")?;
    let panel = Panel::over_size(format!("{op} Performance: BST vs OS-Tree"), y_label)
        .log_y()
        .series(Series::measured(format!("BST {op}"), bst))
        .series(Series::measured(format!("OS-Tree {op}"), os_tree));
    Ok(panel)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OsOperations;

#[typetag::serde]
impl Plot for OsOperations {
    fn name(&self) -> &'static str {
        "OS operations"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Csv
    }

    fn part(&self) -> Part {
        Part::OsTree
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let table = read(ctx, "os_operations.csv")?;
        let sizes = table.column("size")?;
        let select = table.points("size", "select_avg_time")?;
        let rank = table.points("size", "rank_avg_time")?;

        let panel = Panel::over_size(OPERATIONS_TITLE, "Time per Operation (microseconds)")
            .series(Series::measured("OS-Select", select))
            .series(Series::measured("OS-Rank", rank))
            .series(Series::reference("O(log n) scaled", reference::log2(sizes)));
        let chart = Chart::new(ctx.graph_file("os_operations.png")).panel(panel);
        Ok(render(renderer, chart))
    }
}
