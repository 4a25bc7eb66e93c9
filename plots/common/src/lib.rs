use std::{error::Error, fs};

use common::{
    config::Settings,
    plot::{Chart, ChartRenderer, Panel, Series, SeriesKind},
};
use eyre::{Context, Result, bail, eyre};
use itertools::{Itertools, MinMaxResult};
use plotters::{coord::Shift, prelude::*};
use tracing::debug;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Renders charts to PNG files with plotters. Logarithmic axes are drawn in
/// log10 space with ticks labelled in data units. Panels with no measured
/// point that fits their axes are left out of the grid.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    width: u32,
    row_height: u32,
}

impl PngRenderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            width: settings.width,
            row_height: settings.height,
        }
    }
}

impl ChartRenderer for PngRenderer {
    fn render(&self, chart: &Chart) -> Result<()> {
        let panels = chart
            .panels
            .iter()
            .filter_map(Drawable::new)
            .collect::<Vec<_>>();
        if panels.is_empty() {
            bail!("No drawable points in {}", chart.file_name());
        }

        if let Some(parent) = chart.filepath.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| format!("Create {}", parent.display()))?;
        }

        let (rows, cols) = grid(panels.len());
        debug!(
            "Drawing {} as {rows}x{cols} panels",
            chart.filepath.display()
        );
        let size = (self.width, self.row_height * rows as u32);
        let backend = BitMapBackend::new(&chart.filepath, size);
        let root = backend.into_drawing_area();
        draw_chart(&root, &panels, rows, cols)
            .map_err(|e| eyre!("Draw {}: {e}", chart.filepath.display()))
    }
}

/// Rows and columns for `panels` panels, at most two per row.
fn grid(panels: usize) -> (usize, usize) {
    let cols = panels.clamp(1, 2);
    (panels.max(1).div_ceil(cols), cols)
}

#[derive(Debug, Clone, Copy)]
struct Axis {
    log: bool,
}

impl Axis {
    /// Position of `value` on the axis, `None` if it cannot be drawn.
    fn map(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            None
        } else if self.log {
            (value > 0.0).then(|| value.log10())
        } else {
            Some(value)
        }
    }

    fn label(&self, position: f64) -> String {
        let value = if self.log {
            10f64.powf(position)
        } else {
            position
        };
        format_tick(value)
    }
}

/// A panel with its points already mapped onto its axes.
struct Drawable<'a> {
    panel: &'a Panel,
    x_axis: Axis,
    y_axis: Axis,
    series: Vec<(&'a Series, Vec<(f64, f64)>)>,
}

impl<'a> Drawable<'a> {
    /// `None` when no measured point of `panel` can be drawn.
    fn new(panel: &'a Panel) -> Option<Self> {
        let x_axis = Axis { log: panel.log_x };
        let y_axis = Axis { log: panel.log_y };
        let series = panel
            .series
            .iter()
            .map(|s| {
                let points = s
                    .points
                    .iter()
                    .filter_map(|&(x, y)| Some((x_axis.map(x)?, y_axis.map(y)?)))
                    .collect::<Vec<_>>();
                (s, points)
            })
            .collect::<Vec<_>>();

        let measured = series
            .iter()
            .any(|(s, points)| s.kind == SeriesKind::Measured && !points.is_empty());
        if !measured {
            debug!("Leaving out panel {:?}", panel.title);
            return None;
        }
        Some(Self {
            panel,
            x_axis,
            y_axis,
            series,
        })
    }

    fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.series.iter().flat_map(|(_, points)| points.iter())
    }
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 {
        "0".to_owned()
    } else if !(1e-3..1e5).contains(&magnitude) {
        format!("{value:.1e}")
    } else if magnitude >= 100.0 {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.3}")
    }
}

/// Padded range over `values`, or `None` if there are none.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<std::ops::Range<f64>> {
    let (lo, hi) = match values.minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    Some((lo - pad)..(hi + pad))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    panels: &[Drawable<'_>],
    rows: usize,
    cols: usize,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let areas = root.split_evenly((rows, cols));
    for (area, panel) in areas.iter().zip(panels) {
        draw_panel(area, panel)?;
    }
    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    drawable: &Drawable<'_>,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let panel = drawable.panel;
    let x_range = padded_range(drawable.points().map(|p| p.0))
        .ok_or_else(|| format!("no drawable points in {:?}", panel.title))?;
    let y_range = padded_range(drawable.points().map(|p| p.1))
        .ok_or_else(|| format!("no drawable points in {:?}", panel.title))?;

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption(&panel.title, ("sans-serif", 22).into_font())
        .x_label_area_size(45)
        .y_label_area_size(75)
        .build_cartesian_2d(x_range, y_range)?;

    let x_fmt = |v: &f64| drawable.x_axis.label(*v);
    let y_fmt = |v: &f64| drawable.y_axis.label(*v);
    chart
        .configure_mesh()
        .x_desc(&panel.x_label)
        .y_desc(&panel.y_label)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    for (idx, (s, points)) in drawable.series.iter().enumerate() {
        if points.is_empty() {
            continue;
        }
        let color = Palette99::pick(idx).to_rgba();
        match s.kind {
            SeriesKind::Measured => {
                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                    .label(&s.label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
            }
            SeriesKind::Reference => {
                let faded = color.mix(0.6);
                chart
                    .draw_series(LineSeries::new(points.clone(), faded.stroke_width(1)))?
                    .label(&s.label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], faded.stroke_width(1))
                    });
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(title: &str, points: Vec<(f64, f64)>) -> Panel {
        Panel::over_size(title, "y").series(Series::measured(title, points))
    }

    #[test]
    fn grid_layout() {
        assert_eq!(grid(0), (1, 1));
        assert_eq!(grid(1), (1, 1));
        assert_eq!(grid(2), (1, 2));
        assert_eq!(grid(3), (2, 2));
        assert_eq!(grid(6), (3, 2));
    }

    #[test]
    fn log_axis_drops_non_positive() {
        let axis = Axis { log: true };
        assert!((axis.map(1000.0).unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(axis.map(0.0), None);
        assert_eq!(axis.map(-5.0), None);
        assert_eq!(axis.label(2.0), "100");

        let linear = Axis { log: false };
        assert_eq!(linear.map(-5.0), Some(-5.0));
        assert_eq!(linear.map(f64::NAN), None);
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(12.5), "12.50");
        assert_eq!(format_tick(0.25), "0.250");
        assert_eq!(format_tick(1500.0), "1500");
        assert_eq!(format_tick(1e6), "1.0e6");
    }

    #[test]
    fn ranges_are_padded() {
        assert_eq!(padded_range(std::iter::empty()), None);
        assert_eq!(padded_range([2.0].into_iter()), Some(1.5..2.5));
        let range = padded_range([0.0, 10.0, 5.0].into_iter()).unwrap();
        assert_eq!(range, -0.5..10.5);
    }

    #[test]
    fn zero_values_on_a_log_axis_are_not_drawable() {
        let zeros = panel("build", vec![(10.0, 0.0), (100.0, 0.0)]).log_y();
        assert!(Drawable::new(&zeros).is_none());

        let linear = panel("build", vec![(10.0, 0.0), (100.0, 0.0)]);
        assert!(Drawable::new(&linear).is_some());

        let reference_only = Panel::over_size("t", "y")
            .series(Series::measured("s", vec![(10.0, -1.0)]))
            .series(Series::reference("log2(n)", vec![(10.0, 3.3)]))
            .log_y();
        assert!(Drawable::new(&reference_only).is_none());
    }

    #[test]
    fn undrawable_panel_does_not_sink_the_chart() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PngRenderer::new(&Settings::default());

        let path = dir.path().join("mixed.png");
        let chart = Chart::new(path.clone())
            .panel(panel("height", vec![(10.0, 4.0), (100.0, 7.0)]))
            .panel(panel("build", vec![(10.0, 0.0), (100.0, 0.0)]).log_y());
        renderer.render(&chart).unwrap();
        assert!(path.is_file());

        let empty = Chart::new(dir.path().join("zeros.png"))
            .panel(panel("build", vec![(10.0, 0.0), (100.0, 0.0)]).log_y());
        assert!(renderer.render(&empty).is_err());
        assert!(!dir.path().join("zeros.png").exists());
    }
}
