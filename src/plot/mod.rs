//! Scatter-plot rendering to PNG.
//!
//! A [`RenderContext`] carries the output directory and styling and is passed
//! explicitly to every render. Each call owns its drawing surface, so nothing
//! drawn by one render can leak into the next.

pub mod composite;

pub use composite::{
    PlotKind, plot, plot_total_discharges_per_state_pop_vs_state, plot_total_discharges_vs_state,
    plot_total_discharges_vs_state_pop,
};

use anyhow::{Context, Result, anyhow, bail};
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::ffi::OsStr;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::states::PlotPoint;

/// Grid lines per axis; the tick labels use the same count so they line up.
const GRID_LINES: usize = 10;
/// Dots drawn along each grid line.
const GRID_DOTS: usize = 100;
/// Share of each dot's slot that is inked.
const DOT_FILL: f64 = 0.3;

/// Plot area placement as fractions of the image, measured from the left and
/// bottom edges.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Margins {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 0.15,
            right: 0.9,
            bottom: 0.1,
            top: 0.9,
        }
    }
}

/// Labelled points plus the text around them.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<PlotPoint>,
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    margins: Margins,
    marker_radius: u32,
    label_font_size: u32,
    title_font_size: u32,
}

impl RenderContext {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: 800,
            height: 600,
            margins: Margins::default(),
            marker_radius: 3,
            label_font_size: 10,
            title_font_size: 16,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Draws `figure` as a scatter plot and writes it to
    /// `<output_dir>/<file_name>` as PNG, returning the written path.
    ///
    /// `file_name` must be a bare file name; `.png` is appended when it has
    /// no extension.
    #[tracing::instrument(skip(self, figure), fields(title = %figure.title, points = figure.points.len()))]
    pub fn render(&self, figure: &Figure, file_name: &str) -> Result<PathBuf> {
        if figure.points.is_empty() {
            bail!("nothing to plot for {:?}", figure.title);
        }
        if let Some(p) = figure.points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            bail!("non-finite point for {}: ({}, {})", p.state, p.x, p.y);
        }

        let path = self.output_dir.join(png_file_name(file_name)?);
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let x_range = padded_range(figure.points.iter().map(|p| p.x));
        let y_range = padded_range(figure.points.iter().map(|p| p.y));
        debug!(?x_range, ?y_range, "axis ranges");

        self.draw(figure, &path, x_range, y_range)
            .with_context(|| format!("rendering {}", path.display()))?;

        info!(path = %path.display(), "plot written");
        Ok(path)
    }

    fn draw(&self, figure: &Figure, path: &Path, x_range: Range<f64>, y_range: Range<f64>) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let m = self.margins;
        let grid = dotted_grid(&x_range, &y_range);

        let mut chart = ChartBuilder::on(&root)
            .caption(&figure.title, ("sans-serif", self.title_font_size))
            .margin_right(((1.0 - m.right) * w) as u32)
            .margin_top(((1.0 - m.top) * h) as u32)
            .y_label_area_size((m.left * w) as u32)
            .x_label_area_size((m.bottom * h) as u32)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(figure.x_label.as_str())
            .y_desc(figure.y_label.as_str())
            .x_labels(GRID_LINES)
            .y_labels(GRID_LINES)
            .disable_mesh()
            .draw()
            .map_err(draw_err)?;

        let grid_style = RGBColor(176, 176, 176).stroke_width(1);
        chart
            .draw_series(grid.into_iter().map(|seg| PathElement::new(seg, grid_style)))
            .map_err(draw_err)?;

        chart
            .draw_series(
                figure
                    .points
                    .iter()
                    .map(|p| Circle::new((p.x, p.y), self.marker_radius, RED.filled())),
            )
            .map_err(draw_err)?;

        chart
            .draw_series(figure.points.iter().map(|p| {
                Text::new(
                    p.state,
                    (p.x, p.y),
                    ("sans-serif", self.label_font_size).into_font(),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("drawing failed: {e}")
}

/// Dotted vertical and horizontal lines at the axis tick positions.
fn dotted_grid(x_range: &Range<f64>, y_range: &Range<f64>) -> Vec<[(f64, f64); 2]> {
    let xs = RangedCoordf64::from(x_range.clone()).key_points(GRID_LINES);
    let ys = RangedCoordf64::from(y_range.clone()).key_points(GRID_LINES);

    let vertical = xs
        .into_iter()
        .flat_map(|x| dotted_segments((x, y_range.start), (x, y_range.end), GRID_DOTS));
    let horizontal = ys
        .into_iter()
        .flat_map(|y| dotted_segments((x_range.start, y), (x_range.end, y), GRID_DOTS));
    vertical.chain(horizontal).collect()
}

/// `dots` short segments along `from -> to`, evenly spaced with gaps between.
fn dotted_segments(from: (f64, f64), to: (f64, f64), dots: usize) -> Vec<[(f64, f64); 2]> {
    let at = |t: f64| (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
    let slot = 1.0 / dots as f64;
    (0..dots)
        .map(|i| {
            let t = i as f64 * slot;
            [at(t), at(t + slot * DOT_FILL)]
        })
        .collect()
}

/// Validates a caller-supplied file name and forces the PNG extension.
fn png_file_name(file_name: &str) -> Result<String> {
    let path = Path::new(file_name);
    if file_name.is_empty() || path.file_name() != Some(OsStr::new(file_name)) {
        bail!("plot file name must be a bare file name, got {file_name:?}");
    }

    match path.extension().and_then(OsStr::to_str) {
        None => Ok(format!("{file_name}.png")),
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(file_name.to_string()),
        Some(ext) => bail!("plots are written as PNG; unsupported extension {ext:?}"),
    }
}

/// Min..max of `values` widened by 5% on each side, or by 1.0 when flat.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }

    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("health_plots_{name}_{}", std::process::id()))
    }

    fn figure(points: Vec<PlotPoint>) -> Figure {
        Figure {
            title: "039 - EXTRACRANIAL PROCEDURES".into(),
            x_label: "state".into(),
            y_label: "2011 total discharges".into(),
            points,
        }
    }

    fn point(state: &'static str, x: f64, y: f64) -> PlotPoint {
        PlotPoint { state, x, y }
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0].into_iter()), -0.5..10.5);
        assert_eq!(padded_range([3.0, 3.0].into_iter()), 2.0..4.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_dotted_segments_leave_gaps() {
        let dots = dotted_segments((0.0, 0.0), (10.0, 0.0), 5);
        assert_eq!(dots.len(), 5);
        assert_eq!(dots[0][0], (0.0, 0.0));
        for pair in dots.windows(2) {
            assert!(pair[0][1].0 < pair[1][0].0, "dots touch: {pair:?}");
        }
        assert!(dots[4][1].0 < 10.0);
        assert!(dots.iter().all(|[a, b]| a.1 == 0.0 && b.1 == 0.0));
    }

    #[test]
    fn test_dotted_grid_spans_both_axes() {
        let grid = dotted_grid(&(0.0..50.0), &(-10.0..10.0));
        assert!(!grid.is_empty());
        assert_eq!(grid.len() % GRID_DOTS, 0);

        let vertical = grid.iter().filter(|[a, b]| a.0 == b.0).count();
        let horizontal = grid.iter().filter(|[a, b]| a.1 == b.1).count();
        assert!(vertical > 0 && horizontal > 0);
        assert!(
            grid.iter()
                .flatten()
                .all(|&(x, y)| (0.0..=50.0).contains(&x) && (-10.0..=10.0).contains(&y))
        );
    }

    #[test]
    fn test_png_file_name() {
        assert_eq!(png_file_name("a.png").unwrap(), "a.png");
        assert_eq!(png_file_name("a.PNG").unwrap(), "a.PNG");
        assert_eq!(png_file_name("plot1").unwrap(), "plot1.png");
        assert!(png_file_name("a.jpg").is_err());
        assert!(png_file_name("../a.png").is_err());
        assert!(png_file_name("sub/a.png").is_err());
        assert!(png_file_name("").is_err());
    }

    #[test]
    fn test_render_writes_png() {
        let dir = temp_dir("render");
        let _ = fs::remove_dir_all(&dir);
        let ctx = RenderContext::new(&dir).with_size(400, 300);

        let path = ctx
            .render(
                &figure(vec![point("AK", 0.0, 10.0), point("AL", 1.0, 25.0), point("AR", 2.0, 0.0)]),
                "render.png",
            )
            .unwrap();

        assert_eq!(path, dir.join("render.png"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_consecutive_renders_are_independent() {
        let dir = temp_dir("independent");
        let _ = fs::remove_dir_all(&dir);
        let ctx = RenderContext::new(&dir).with_size(300, 200);
        let fig = figure(vec![point("CA", 1.0, 1.0), point("NY", 2.0, 2.0)]);

        let first = ctx.render(&fig, "first.png").unwrap();
        ctx.render(&figure(vec![point("TX", 5.0, 9.0)]), "other.png").unwrap();
        let again = ctx.render(&fig, "again.png").unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(again).unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_rejects_empty_and_non_finite() {
        let ctx = RenderContext::new(temp_dir("rejects"));
        assert!(ctx.render(&figure(vec![]), "empty.png").is_err());
        assert!(
            ctx.render(&figure(vec![point("CA", 1.0, f64::INFINITY)]), "inf.png")
                .is_err()
        );
    }
}
