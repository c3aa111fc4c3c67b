//! Static Chart Renderer
//! Draws the prepared views with plotters into RGB buffers and PNG files.
//!
//! Chart kinds:
//! 1. Stacked bars: one bar per year, one stacked segment per group
//! 2. Violins: KDE outline + box + mean line, optional jittered points and
//!    reference lines with a boxed label
//! 3. Histogram: equal-width bins with a marginal box plot above
//! 4. Split violin: two half violins mirrored on one axis
//! 5. Timeline: one row per student, one segment per level

use crate::charts::views::*;
use crate::data::DualLevelRecord;
use crate::stats::{gaussian_kde, BoxSummary, DensityCurve, StackedCounts, StatsCalculator};
use chrono::{Datelike, NaiveDate};
use image::{ImageFormat, RgbImage};
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const FONT: &str = "sans-serif";
const TITLE_SIZE: i32 = 26;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const BOX_HALF_WIDTH: f64 = 0.06;
const POINT_OFFSET: f64 = 0.65;
const POINT_JITTER: f64 = 0.08;
const BAR_HALF_WIDTH: f64 = 0.45;

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing '{title}' failed: {message}")]
    Draw { title: String, message: String },
    #[error("Image buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which side of its center a violin occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Both,
    Negative,
    Positive,
}

impl Side {
    fn sign(&self) -> f64 {
        match self {
            Side::Negative => -1.0,
            _ => 1.0,
        }
    }
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render one chart into an RGB image.
    pub fn render_rgb(
        chart: &PreparedChart,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        let draw_err = |e: DrawingAreaErrorKind<_>| RenderError::Draw {
            title: chart.title.clone(),
            message: e.to_string(),
        };

        let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            Self::draw(&root, chart).map_err(draw_err)?;
            root.present().map_err(draw_err)?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer(width, height))
    }

    /// Render every chart in parallel, keeping the input order.
    pub fn render_all(
        charts: &[PreparedChart],
        width: u32,
        height: u32,
    ) -> Result<Vec<RgbImage>, RenderError> {
        charts
            .par_iter()
            .map(|chart| Self::render_rgb(chart, width, height))
            .collect()
    }

    /// Write every chart as `<dir>/<NN_name>.png`.
    pub fn export_all(
        charts: &[PreparedChart],
        dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let paths = charts
            .par_iter()
            .map(|chart| {
                let path = dir.join(format!("{}.png", chart.view.file_stem()));
                let img = Self::render_rgb(chart, width, height)?;
                img.save_with_format(&path, ImageFormat::Png)?;
                debug!("Saved {}", path.display());
                Ok(path)
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        info!("Exported {} charts to {}", paths.len(), dir.display());
        Ok(paths)
    }

    /// Draw a chart on any plotters backend.
    pub fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
    ) -> DrawResult<DB> {
        match &chart.data {
            ChartData::StackedBar(counts) => Self::draw_stacked_bar(root, chart, counts),
            ChartData::Violins {
                groups,
                reference,
                show_points,
            } => Self::draw_violins(root, chart, groups, *reference, *show_points),
            ChartData::Histogram {
                values,
                bins,
                range,
            } => Self::draw_histogram(root, chart, values, *bins, *range),
            ChartData::SplitViolin { left, right } => {
                Self::draw_split_violin(root, chart, left, right)
            }
            ChartData::Timeline(records) => Self::draw_timeline(root, chart, records),
        }
    }

    fn draw_stacked_bar<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
        counts: &StackedCounts,
    ) -> DrawResult<DB> {
        let first = counts.years.first().copied().unwrap_or(0) as f64;
        let last = counts.years.last().copied().unwrap_or(0) as f64;
        let y_max = counts.max_total().max(1) as f64 * 1.1;
        let keys: Vec<f64> = counts.years.iter().map(|&y| y as f64).collect();

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(70)
            .build_cartesian_2d((first - 0.5..last + 0.5).with_key_points(keys), 0f64..y_max)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90))
            .draw()?;

        let mut base = vec![0u32; counts.years.len()];
        for (idx, (name, values)) in counts.series.iter().enumerate() {
            let color = SERIES_PALETTE[idx % SERIES_PALETTE.len()];
            let bars: Vec<Rectangle<(f64, f64)>> = counts
                .years
                .iter()
                .zip(values)
                .zip(base.iter())
                .filter(|((_, &count), _)| count > 0)
                .map(|((&year, &count), &below)| {
                    let x = year as f64;
                    Rectangle::new(
                        [
                            (x - BAR_HALF_WIDTH, below as f64),
                            (x + BAR_HALF_WIDTH, (below + count) as f64),
                        ],
                        color.filled(),
                    )
                })
                .collect();
            for (acc, count) in base.iter_mut().zip(values) {
                *acc += count;
            }

            ctx.draw_series(bars)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled()));
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((FONT, 14))
            .draw()?;

        Ok(())
    }

    fn draw_violins<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
        groups: &[ViolinGroup],
        reference: Option<ReferenceLines>,
        show_points: bool,
    ) -> DrawResult<DB> {
        let curves: Vec<Option<DensityCurve>> =
            groups.iter().map(|g| gaussian_kde(&g.values)).collect();
        let references: Vec<f64> = reference
            .map(|r| vec![r.expected, r.limit])
            .unwrap_or_default();
        let (y_lo, y_hi) = value_span(&curves, &references);

        let x_start = if show_points { -1.0 } else { -0.5 };
        let x_end = groups.len() as f64 - 0.5;
        let keys: Vec<f64> = (0..groups.len()).map(|i| i as f64).collect();
        let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
        let formatter = move |x: &f64| category_label(&labels, *x);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((x_start..x_end).with_key_points(keys), y_lo..y_hi)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .x_label_formatter(&formatter)
            .draw()?;

        for (i, (group, curve)) in groups.iter().zip(&curves).enumerate() {
            let Some(curve) = curve else {
                continue;
            };
            let center = i as f64;
            let scaled = curve.scaled(VIOLIN_HALF_WIDTH);

            ctx.draw_series(std::iter::once(Polygon::new(
                violin_outline(center, &scaled, Side::Both),
                group.color.mix(0.25).filled(),
            )))?;
            ctx.draw_series(std::iter::once(PathElement::new(
                closed(violin_outline(center, &scaled, Side::Both)),
                group.color.stroke_width(2),
            )))?;

            if let Some(summary) = StatsCalculator::box_summary(&group.values) {
                draw_box_overlay(&mut ctx, center, &scaled, &summary, Side::Both, group.color)?;
            }

            if show_points {
                let points = group.values.iter().enumerate().map(|(k, &v)| {
                    Circle::new(
                        (center - POINT_OFFSET + jitter(k) * POINT_JITTER, v),
                        3,
                        group.color.mix(0.7).filled(),
                    )
                });
                ctx.draw_series(points)?;
            }
        }

        if let Some(lines) = reference {
            let (from, to) = reference_span(groups.len(), show_points, x_start, x_end);
            draw_reference_line(&mut ctx, from, to, lines.expected, EXPECTED_LINE)?;
            draw_reference_line(&mut ctx, from, to, lines.limit, LIMIT_LINE)?;
        }

        Ok(())
    }

    fn draw_split_violin<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
        left: &ViolinGroup,
        right: &ViolinGroup,
    ) -> DrawResult<DB> {
        let sides = [(left, Side::Negative), (right, Side::Positive)];
        let curves: Vec<Option<DensityCurve>> =
            sides.iter().map(|(g, _)| gaussian_kde(&g.values)).collect();
        let (y_lo, y_hi) = value_span(&curves, &[]);

        let labels = vec![left.label.clone(), right.label.clone()];
        let formatter = move |x: &f64| {
            if (x + 0.25).abs() < 1e-6 {
                labels[0].clone()
            } else if (x - 0.25).abs() < 1e-6 {
                labels[1].clone()
            } else {
                String::new()
            }
        };

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((-0.6f64..0.6).with_key_points(vec![-0.25, 0.25]), y_lo..y_hi)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .x_label_formatter(&formatter)
            .draw()?;

        for ((group, side), curve) in sides.iter().zip(&curves) {
            let Some(curve) = curve else {
                continue;
            };
            let scaled = curve.scaled(VIOLIN_HALF_WIDTH);
            let outline = violin_outline(0.0, &scaled, *side);

            ctx.draw_series(std::iter::once(Polygon::new(
                outline.clone(),
                group.color.mix(0.25).filled(),
            )))?;
            ctx.draw_series(std::iter::once(PathElement::new(
                closed(outline),
                group.color.stroke_width(2),
            )))?;

            if let Some(summary) = StatsCalculator::box_summary(&group.values) {
                draw_box_overlay(&mut ctx, 0.0, &scaled, &summary, *side, group.color)?;
            }
        }

        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
        values: &[f64],
        bins: usize,
        range: (f64, f64),
    ) -> DrawResult<DB> {
        let color = SERIES_PALETTE[0];
        let area = root.titled(&chart.title, (FONT, TITLE_SIZE))?;
        let (_, height) = area.dim_in_pixel();
        let (top, bottom) = area.split_vertically(height / 5);

        // Marginal box, sharing the histogram's x range
        let mut margin = ChartBuilder::on(&top)
            .margin(10)
            .margin_bottom(0)
            .x_label_area_size(0)
            .y_label_area_size(70)
            .build_cartesian_2d(range.0..range.1, 0f64..1f64)?;

        if let Some(summary) = StatsCalculator::box_summary(values) {
            let clamp = |v: f64| v.clamp(range.0, range.1);
            margin.draw_series(std::iter::once(Rectangle::new(
                [(clamp(summary.q1), 0.25), (clamp(summary.q3), 0.75)],
                color.mix(0.4).filled(),
            )))?;
            margin.draw_series(std::iter::once(Rectangle::new(
                [(clamp(summary.q1), 0.25), (clamp(summary.q3), 0.75)],
                color.stroke_width(2),
            )))?;
            margin.draw_series([
                PathElement::new(
                    vec![(clamp(summary.median), 0.25), (clamp(summary.median), 0.75)],
                    color.stroke_width(2),
                ),
                PathElement::new(
                    vec![(clamp(summary.whisker_low), 0.5), (clamp(summary.q1), 0.5)],
                    color.stroke_width(1),
                ),
                PathElement::new(
                    vec![(clamp(summary.q3), 0.5), (clamp(summary.whisker_high), 0.5)],
                    color.stroke_width(1),
                ),
            ])?;
            let outliers = values
                .iter()
                .filter(|&&v| v < summary.whisker_low || v > summary.whisker_high)
                .filter(|&&v| v >= range.0 && v <= range.1)
                .map(|&v| Circle::new((v, 0.5), 3, color.filled()));
            margin.draw_series(outliers)?;
        }

        let histogram = histogram_bins(values, bins);
        let y_max = histogram.iter().map(|b| b.2).max().unwrap_or(1).max(1) as f64 * 1.1;

        let mut ctx = ChartBuilder::on(&bottom)
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(range.0..range.1, 0f64..y_max)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        let bars = histogram
            .iter()
            .filter(|(start, end, count)| *count > 0 && *end > range.0 && *start < range.1)
            .map(|&(start, end, count)| {
                Rectangle::new(
                    [
                        (start.max(range.0), 0.0),
                        (end.min(range.1), count as f64),
                    ],
                    color.filled(),
                )
            });
        ctx.draw_series(bars)?;

        Ok(())
    }

    fn draw_timeline<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PreparedChart,
        records: &[DualLevelRecord],
    ) -> DrawResult<DB> {
        if records.is_empty() {
            let area = root.titled(&chart.title, (FONT, TITLE_SIZE))?;
            let (w, h) = area.dim_in_pixel();
            let style = (FONT, 18)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw(&Text::new(
                "Nenhum egresso cursou os dois níveis",
                ((w / 2) as i32, (h / 2) as i32),
                style,
            ))?;
            return Ok(());
        }

        let (start, end) = timeline_span(records);
        let keys: Vec<f64> = (start.ceil() as i32..=end.floor() as i32)
            .map(f64::from)
            .collect();
        let rows = records.len() as f64;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(10)
            .build_cartesian_2d((start..end).with_key_points(keys), 0f64..rows + 2.0)?;

        ctx.configure_mesh()
            .disable_y_mesh()
            .disable_y_axis()
            .x_desc(chart.x_desc.as_str())
            .x_label_formatter(&|x| format!("{:.0}", x))
            .x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90))
            .draw()?;

        for (i, record) in records.iter().enumerate() {
            let y = i as f64 + 2.0;
            for (admission, status, color) in [
                (record.masters_admission, record.masters_status, MASTERS_SEGMENT),
                (record.doctorate_admission, record.doctorate_status, DOCTORATE_SEGMENT),
            ] {
                let x0 = decimal_year(admission);
                let x1 = decimal_year(status);
                ctx.draw_series(LineSeries::new(vec![(x0, y), (x1, y)], color.stroke_width(2)))?;
                ctx.draw_series([
                    EmptyElement::at((x0, y))
                        + Polygon::new(vec![(-4, -5), (6, 0), (-4, 5)], color.filled()),
                    EmptyElement::at((x1, y))
                        + Polygon::new(vec![(4, -5), (-6, 0), (4, 5)], color.filled()),
                ])?;
            }
        }

        Ok(())
    }
}

/// Box, median, whiskers and mean line drawn inside a violin.
fn draw_box_overlay<DB, CT>(
    ctx: &mut ChartContext<'_, DB, CT>,
    center: f64,
    scaled: &[(f64, f64)],
    summary: &BoxSummary,
    side: Side,
    color: RGBColor,
) -> DrawResult<DB>
where
    DB: DrawingBackend,
    CT: CoordTranslate<From = (f64, f64)>,
{
    let (inner, outer) = span_for(center, BOX_HALF_WIDTH, side);
    let whisker_x = match side {
        Side::Both => center,
        _ => center + side.sign() * BOX_HALF_WIDTH / 2.0,
    };

    ctx.draw_series(std::iter::once(Rectangle::new(
        [(inner, summary.q1), (outer, summary.q3)],
        color.mix(0.8).filled(),
    )))?;
    ctx.draw_series([
        PathElement::new(
            vec![(inner, summary.median), (outer, summary.median)],
            WHITE.stroke_width(2),
        ),
        PathElement::new(
            vec![(whisker_x, summary.whisker_low), (whisker_x, summary.q1)],
            color.stroke_width(1),
        ),
        PathElement::new(
            vec![(whisker_x, summary.q3), (whisker_x, summary.whisker_high)],
            color.stroke_width(1),
        ),
    ])?;

    let (mean_inner, mean_outer) = span_for(center, width_at(scaled, summary.mean), side);
    ctx.draw_series(std::iter::once(PathElement::new(
        vec![(mean_inner, summary.mean), (mean_outer, summary.mean)],
        color.stroke_width(2),
    )))?;

    Ok(())
}

/// Horizontal reference line with a white-boxed label at its middle.
fn draw_reference_line<DB, CT>(
    ctx: &mut ChartContext<'_, DB, CT>,
    x_start: f64,
    x_end: f64,
    value: f64,
    color: RGBColor,
) -> DrawResult<DB>
where
    DB: DrawingBackend,
    CT: CoordTranslate<From = (f64, f64)>,
{
    let label = format!("{:.0} meses", value);
    let half_width = label.chars().count() as i32 * 4 + 6;
    let style = (FONT, 14)
        .into_font()
        .color(&color)
        .pos(Pos::new(HPos::Center, VPos::Center));

    ctx.draw_series(LineSeries::new(
        vec![(x_start, value), (x_end, value)],
        color.stroke_width(2),
    ))?;
    ctx.draw_series(std::iter::once(
        EmptyElement::at(((x_start + x_end) / 2.0, value))
            + Rectangle::new([(-half_width, -10), (half_width, 10)], WHITE.filled())
            + Text::new(label, (0, 0), style),
    ))?;

    Ok(())
}

/// Horizontal extent of the reference lines: first to last violin center
/// when there are several categories, the whole axis otherwise.
fn reference_span(groups: usize, show_points: bool, x_start: f64, x_end: f64) -> (f64, f64) {
    if show_points || groups < 2 {
        (x_start, x_end)
    } else {
        (0.0, (groups - 1) as f64)
    }
}

/// Inner and outer x of a shape of `half_width` on one side of `center`.
fn span_for(center: f64, half_width: f64, side: Side) -> (f64, f64) {
    match side {
        Side::Both => (center - half_width, center + half_width),
        Side::Negative => (center - half_width, center),
        Side::Positive => (center, center + half_width),
    }
}

/// Polygon of a violin from `(value, half_width)` samples.
pub fn violin_outline(center: f64, scaled: &[(f64, f64)], side: Side) -> Vec<(f64, f64)> {
    match side {
        Side::Both => scaled
            .iter()
            .map(|&(v, w)| (center + w, v))
            .chain(scaled.iter().rev().map(|&(v, w)| (center - w, v)))
            .collect(),
        Side::Negative | Side::Positive => {
            let sign = side.sign();
            let first = scaled.first().map(|p| p.0).unwrap_or_default();
            let last = scaled.last().map(|p| p.0).unwrap_or_default();
            std::iter::once((center, first))
                .chain(scaled.iter().map(|&(v, w)| (center + sign * w, v)))
                .chain(std::iter::once((center, last)))
                .collect()
        }
    }
}

fn closed(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Violin half width at `value`, interpolated between samples.
pub fn width_at(scaled: &[(f64, f64)], value: f64) -> f64 {
    scaled
        .windows(2)
        .find(|pair| pair[0].0 <= value && value <= pair[1].0)
        .map(|pair| {
            let (v0, w0) = pair[0];
            let (v1, w1) = pair[1];
            if v1 > v0 {
                w0 + (w1 - w0) * (value - v0) / (v1 - v0)
            } else {
                w0
            }
        })
        .unwrap_or(0.0)
}

/// Vertical span of the density curves and extra values, padded by 5%.
fn value_span(curves: &[Option<DensityCurve>], extra: &[f64]) -> (f64, f64) {
    let values = curves
        .iter()
        .flatten()
        .flat_map(|c| c.points.iter().map(|p| p.0))
        .chain(extra.iter().copied());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}

/// Label of the category whose center is at `x`, empty between centers.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Deterministic spread in [-1, 1) for the k-th point.
pub fn jitter(k: usize) -> f64 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    ((k as f64 + 1.0) * GOLDEN).fract() * 2.0 - 1.0
}

/// Equal-width bins over the data span as `(start, end, count)`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = min + i as f64 * width;
            (start, start + width, count)
        })
        .collect()
}

/// Date as a fractional year, for the timeline x axis.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year = NaiveDate::from_ymd_opt(date.year(), 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365);
    date.year() as f64 + date.ordinal0() as f64 / days_in_year as f64
}

/// X span of the timeline, widened to whole years plus a half-year margin.
fn timeline_span(records: &[DualLevelRecord]) -> (f64, f64) {
    let dates = records.iter().flat_map(|r| {
        [
            r.masters_admission,
            r.masters_status,
            r.doctorate_admission,
            r.doctorate_status,
        ]
    });
    let (lo, hi) = dates.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
        let x = decimal_year(d);
        (lo.min(x), hi.max(x))
    });
    (lo.floor() - 0.5, hi.ceil() + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value_once() {
        let values = [20.0, 25.0, 25.5, 30.0, 59.9, 60.0];
        let bins = histogram_bins(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), values.len());
        assert_eq!(bins[0].0, 20.0);
        assert!((bins[29].1 - 60.0).abs() < 1e-9);
        assert_eq!(bins[29].2, 2);
    }

    #[test]
    fn test_histogram_of_identical_values() {
        let bins = histogram_bins(&[30.0, 30.0], 30);
        assert_eq!(bins[0].2, 2);
        assert!(histogram_bins(&[], 30).is_empty());
    }

    #[test]
    fn test_violin_outline_sides() {
        let scaled = [(10.0, 0.0), (20.0, 0.4), (30.0, 0.0)];

        let both = violin_outline(1.0, &scaled, Side::Both);
        assert_eq!(both.len(), 6);
        assert_eq!(both[1], (1.4, 20.0));
        assert_eq!(both[4], (0.6, 20.0));

        let left = violin_outline(0.0, &scaled, Side::Negative);
        assert_eq!(left.first(), Some(&(0.0, 10.0)));
        assert_eq!(left.last(), Some(&(0.0, 30.0)));
        assert!(left.iter().all(|&(x, _)| x <= 0.0));

        let right = violin_outline(0.0, &scaled, Side::Positive);
        assert!(right.iter().all(|&(x, _)| x >= 0.0));
    }

    #[test]
    fn test_width_interpolates() {
        let scaled = [(10.0, 0.0), (20.0, 0.4)];
        assert!((width_at(&scaled, 15.0) - 0.2).abs() < 1e-12);
        assert_eq!(width_at(&scaled, 25.0), 0.0);
    }

    #[test]
    fn test_jitter_is_bounded() {
        assert!((0..500).map(jitter).all(|j| (-1.0..1.0).contains(&j)));
        assert_ne!(jitter(0), jitter(1));
    }

    #[test]
    fn test_category_labels_only_at_centers() {
        let labels = vec!["2000-2010".to_string(), "2010-2020".to_string()];
        assert_eq!(category_label(&labels, 1.0), "2010-2020");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
    }

    #[test]
    fn test_decimal_year() {
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(decimal_year(jan), 2020.0);
        let jul = NaiveDate::from_ymd_opt(2021, 7, 2).unwrap();
        assert!((decimal_year(jul) - 2021.5).abs() < 0.01);
    }

    #[test]
    fn test_reference_lines_join_decade_centers() {
        assert_eq!(reference_span(4, false, -0.5, 3.5), (0.0, 3.0));
        assert_eq!(reference_span(1, false, -0.5, 0.5), (-0.5, 0.5));
        assert_eq!(reference_span(1, true, -1.0, 0.5), (-1.0, 0.5));
    }

    #[test]
    fn test_value_span_includes_reference_lines() {
        let curve = gaussian_kde(&[20.0, 22.0, 24.0]).unwrap();
        let (lo, hi) = value_span(&[Some(curve)], &[36.0]);
        assert!(lo < 20.0);
        assert!(hi > 36.0);
    }
}
