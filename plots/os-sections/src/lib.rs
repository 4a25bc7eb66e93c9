use common::{
    plot::{
        Chart, ChartOutcome, ChartRenderer, Panel, Part, Plot, PlotContext, PlotGroup, Series,
        render_chart,
    },
    sections::{SectionLog, SizeTable, size_column},
    stats::reference,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One experiment section and the chart drawn from it.
struct Operation {
    section: &'static str,
    file: &'static str,
    op: &'static str,
    label: &'static str,
}

const INSERT: Operation = Operation {
    section: "Experiment 1: INSERT Time Comparison (OS-Tree vs BST)",
    file: "insert_comparison.png",
    op: "INSERT",
    label: "Insert",
};
const DELETE: Operation = Operation {
    section: "Experiment 2: DELETE Time Comparison (OS-Tree vs BST)",
    file: "delete_comparison.png",
    op: "DELETE",
    label: "Delete",
};
const SELECT: Operation = Operation {
    section: "Experiment 3: OS-SELECT Runtime",
    file: "os_select_runtime.png",
    op: "OS-SELECT",
    label: "OS-Select",
};
const RANK: Operation = Operation {
    section: "Experiment 4: OS-RANK Runtime",
    file: "os_rank_runtime.png",
    op: "OS-RANK",
    label: "OS-Rank",
};

const COMBINED_FILE: &str = "os_operations_combined.png";
const COMBINED_TITLE: &str = "Order-Statistic Operations: OS-Select & OS-Rank";

// Bucket columns.
const BST_TIME: usize = 0;
const OS_TIME: usize = 1;
const OVERHEAD: usize = 2;
const PER_OP: usize = 1;

/// Charts from the `=== Experiment N: ... ===` order-statistic tree log.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OsSections;

#[typetag::serde]
impl Plot for OsSections {
    fn name(&self) -> &'static str {
        "OS-Tree experiment log"
    }

    fn group(&self) -> PlotGroup {
        PlotGroup::Os
    }

    fn part(&self) -> Part {
        Part::OsTree
    }

    fn plot(
        &self,
        ctx: &PlotContext<'_>,
        renderer: &dyn ChartRenderer,
    ) -> Result<Vec<ChartOutcome>> {
        let path = ctx.input_or(&ctx.settings.os_log);
        let log = SectionLog::parse_file(&path)?;
        debug!(
            "Sections in {}: {:?}",
            path.display(),
            log.names().collect::<Vec<_>>()
        );

        let table = |op: &Operation| log.section(op.section).map(|s| s.by_size());
        let select = table(&SELECT);
        let rank = table(&RANK);

        let mut outcomes = vec![
            comparison(ctx, renderer, table(&INSERT).as_ref(), &INSERT),
            comparison(ctx, renderer, table(&DELETE).as_ref(), &DELETE),
            runtime(ctx, renderer, select.as_ref(), &SELECT),
            runtime(ctx, renderer, rank.as_ref(), &RANK),
        ];

        outcomes.push(match (&select, &rank) {
            (Some(select), Some(rank)) => render_chart(renderer, &combined(ctx, select, rank)),
            _ => ChartOutcome::skipped(COMBINED_FILE, "needs both OS-SELECT and OS-RANK data"),
        });
        Ok(outcomes)
    }
}

fn no_section(file: &str) -> ChartOutcome {
    ChartOutcome::skipped(file, "section has no data")
}

fn comparison(
    ctx: &PlotContext<'_>,
    renderer: &dyn ChartRenderer,
    table: Option<&SizeTable>,
    operation: &Operation,
) -> ChartOutcome {
    let Operation { file, op, label, .. } = *operation;
    let Some(table) = table else {
        return no_section(file);
    };
    let overhead = size_column(table, OVERHEAD);
    let sizes = overhead.iter().map(|p| p.0).collect::<Vec<_>>();

    let bst = Series::measured(format!("BST {label}"), size_column(table, BST_TIME));
    let os_tree = Series::measured(format!("OS-Tree {label}"), size_column(table, OS_TIME));
    let no_overhead = Series::reference("No overhead (ratio=1)", reference::constant(&sizes, 1.0));
    let overhead_title = format!("OS-Tree {op} Overhead");

    let chart = Chart::new(ctx.graph_file(file))
        .panel(
            Panel::over_size(format!("{op} Time: OS-Tree vs BST"), "Time (ms)")
                .x_label("Tree Size (n)")
                .log_y()
                .series(bst)
                .series(os_tree),
        )
        .panel(
            Panel::over_size(overhead_title, "Overhead Ratio (OS-Tree / BST)")
                .x_label("Tree Size (n)")
                .series(Series::measured("Overhead Ratio", overhead))
                .series(no_overhead),
        );
    render_chart(renderer, &chart)
}

/// `log2(n)` scaled by `scale`, or nothing when there is no usable scale.
fn scaled_reference(sizes: &[f64], scale: Option<f64>) -> Vec<(f64, f64)> {
    scale
        .map(|scale| reference::scaled_log2(sizes, scale))
        .unwrap_or_default()
}

fn runtime(
    ctx: &PlotContext<'_>,
    renderer: &dyn ChartRenderer,
    table: Option<&SizeTable>,
    operation: &Operation,
) -> ChartOutcome {
    let Operation { file, op, label, .. } = *operation;
    let Some(table) = table else {
        return no_section(file);
    };
    let per_op = size_column(table, PER_OP);
    let sizes = per_op.iter().map(|p| p.0).collect::<Vec<_>>();
    let scale = per_op
        .last()
        .and_then(|&(n, t)| reference::last_point_scale(n, t));
    let theory = Series::reference("O(log n) theoretical", scaled_reference(&sizes, scale));

    let panel = Panel::over_size(format!("{op} Runtime Analysis"), "Time per Operation (μs)")
        .x_label("Tree Size (n)")
        .log_y()
        .series(Series::measured(format!("{label} (measured)"), per_op))
        .series(theory);
    let chart = Chart::new(ctx.graph_file(file)).panel(panel);
    render_chart(renderer, &chart)
}

fn combined(ctx: &PlotContext<'_>, select: &SizeTable, rank: &SizeTable) -> Chart {
    // Only sizes measured by both operations.
    let (select, rank): (Vec<_>, Vec<_>) = select
        .iter()
        .filter_map(|(&n, s)| {
            let s = *s.get(PER_OP)?;
            let r = *rank.get(&n)?.get(PER_OP)?;
            Some(((n as f64, s), (n as f64, r)))
        })
        .unzip();
    let sizes = select.iter().map(|p| p.0).collect::<Vec<_>>();
    let scale = select
        .last()
        .zip(rank.last())
        .and_then(|(&(n, s), &(_, r))| reference::last_point_scale(n, (s + r) / 2.0));
    let theory = Series::reference("O(log n) reference", scaled_reference(&sizes, scale));

    let panel = Panel::over_size(COMBINED_TITLE, "Time per Operation (μs)")
        .x_label("Tree Size (n)")
        .log_y()
        .series(Series::measured("OS-Select", select))
        .series(Series::measured("OS-Rank", rank))
        .series(theory);
    Chart::new(ctx.graph_file(COMBINED_FILE)).panel(panel)
}
