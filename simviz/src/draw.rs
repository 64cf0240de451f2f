//! Rendering of [`LineFigure`] and [`BoxFigure`] to PNG.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use tracing::debug;

use crate::backend::FontSafeBackend;
use crate::figure::{BoxFigure, BoxPanel, Legend, LineFigure, LinePanel};
use crate::layout::FigureLayout;
use crate::style::{MarkerSymbol, PALETTE};
use crate::Result;

type PanelChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const DASH_COUNT: usize = 36;
const DOT_COUNT: usize = 110;
/// Fraction of the x slot covered by the boxes of one category.
const BOX_GROUP_WIDTH: f64 = 0.8;

pub(crate) fn render_line_figure(
    path: &Path,
    figure: &LineFigure,
    width: u32,
    height: u32,
    layout: &FigureLayout,
) -> Result<()> {
    let size = layout.canvas(width, height)?;
    let backend = BitMapBackend::new(path, size);
    let root = FontSafeBackend::new(backend).into_drawing_area();
    draw_line_figure(root, figure, layout)?;
    debug!(
        "Rendered {} panels / {} traces into {}",
        figure.panels.len(),
        figure.trace_count(),
        path.display()
    );
    Ok(())
}

pub(crate) fn render_box_figure(
    path: &Path,
    figure: &BoxFigure,
    width: u32,
    height: u32,
    layout: &FigureLayout,
) -> Result<()> {
    let size = layout.canvas(width, height)?;
    let backend = BitMapBackend::new(path, size);
    let root = FontSafeBackend::new(backend).into_drawing_area();
    draw_box_figure(root, figure, layout)?;
    debug!(
        "Rendered {} facets into {}",
        figure.panels.len(),
        path.display()
    );
    Ok(())
}

fn draw_line_figure<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    figure: &LineFigure,
    layout: &FigureLayout,
) -> Result<()> {
    root.fill(&WHITE)?;
    let (grid, legend_area) = split_body(&root, &figure.legend, layout);
    let cells = grid.split_evenly((figure.rows.max(1), figure.cols.max(1)));
    for (panel, cell) in figure.panels.iter().zip(cells.iter()) {
        draw_line_panel(cell, panel, figure.y_range(panel), layout)?;
    }
    draw_legend(&legend_area, &figure.legend, layout)?;
    root.present()?;
    Ok(())
}

fn draw_box_figure<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    figure: &BoxFigure,
    layout: &FigureLayout,
) -> Result<()> {
    root.fill(&WHITE)?;
    let (grid, legend_area) = split_body(&root, &figure.legend, layout);
    let cells = grid.split_evenly((figure.rows.max(1), figure.cols.max(1)));
    let y_range = figure.y_range();
    for (panel, cell) in figure.panels.iter().zip(cells.iter()) {
        draw_box_panel(cell, panel, figure, y_range, layout)?;
    }
    draw_legend(&legend_area, &figure.legend, layout)?;
    root.present()?;
    Ok(())
}

/// Applies the figure margins and reserves a strip for the legend.
fn split_body<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    legend: &Legend,
    layout: &FigureLayout,
) -> (DrawingArea<DB, Shift>, DrawingArea<DB, Shift>) {
    let body = root.margin(
        layout.px(layout.margin_top) as i32,
        layout.px(layout.margin_bottom) as i32,
        layout.px(layout.margin_left) as i32,
        layout.px(layout.margin_right) as i32,
    );
    let (_, body_height) = body.dim_in_pixel();
    let legend_height = if legend.entries.is_empty() {
        0
    } else {
        layout.px(layout.legend_height)
    };
    body.split_vertically(body_height.saturating_sub(legend_height) as i32)
}

fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

fn build_panel_chart<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    categories: &[String],
    x_title: Option<&str>,
    y_title: Option<&str>,
    (y_lo, y_hi): (f64, f64),
    layout: &FigureLayout,
) -> Result<PanelChart<'a, DB>> {
    let slots = categories.len().max(1);
    let x_label_area = if x_title.is_some() { 44 } else { 26 };
    let y_label_area = if y_title.is_some() { 62 } else { 46 };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(layout.px(6) as i32)
        .x_label_area_size(layout.px(x_label_area) as i32)
        .y_label_area_size(layout.px(y_label_area) as i32);
    if !title.is_empty() {
        builder.caption(title, font(layout.font(layout.title_font_size)));
    }
    let mut chart = builder.build_cartesian_2d(-0.5..(slots as f64 - 0.5), y_lo..y_hi)?;

    let x_formatter = |v: &f64| category_label(categories, *v);
    let y_formatter = |v: &f64| format_tick(*v);
    let tick_font = font(layout.font(layout.tick_font_size));
    let axis_font = font(layout.font(layout.axis_title_font_size));

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(&RGBColor(232, 232, 232))
        .x_labels(slots)
        .y_labels(6)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .label_style(tick_font.color(&BLACK.mix(0.85)))
        .axis_desc_style(axis_font.color(&BLACK));
    if let Some(desc) = x_title {
        mesh.x_desc(desc);
    }
    if let Some(desc) = y_title {
        mesh.y_desc(desc);
    }
    mesh.draw()?;

    Ok(chart)
}

fn draw_line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &LinePanel,
    y_range: (f64, f64),
    layout: &FigureLayout,
) -> Result<()> {
    let mut chart = build_panel_chart(
        area,
        &panel.title,
        &panel.categories,
        panel.x_title.as_deref(),
        panel.y_title.as_deref(),
        y_range,
        layout,
    )?;

    if let Some(y) = panel.reference_line {
        draw_reference_line(&mut chart, panel.categories.len(), y, DASH_COUNT, BLACK, layout)?;
    }

    let radius = marker_radius(layout);
    for trace in &panel.traces {
        for run in finite_runs(&trace.points) {
            chart.draw_series(LineSeries::new(
                run.iter().copied(),
                trace.color.stroke_width(layout.px(layout.line_width)),
            ))?;
            for &point in &run {
                draw_marker(chart.plotting_area(), point, trace.symbol, radius, trace.color)?;
            }
        }
    }
    Ok(())
}

/// Consecutive finite points; a missing value breaks the line.
fn finite_runs(points: &[(usize, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &(idx, y) in points {
        if y.is_finite() {
            current.push((idx as f64, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn draw_box_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &BoxPanel,
    figure: &BoxFigure,
    y_range: (f64, f64),
    layout: &FigureLayout,
) -> Result<()> {
    let mut chart = build_panel_chart(
        area,
        &panel.title,
        &figure.categories,
        panel.x_title.as_deref(),
        panel.y_title.as_deref(),
        y_range,
        layout,
    )?;

    if let Some(y) = figure.reference_line {
        let gray = RGBColor(128, 128, 128);
        draw_reference_line(&mut chart, figure.categories.len(), y, DOT_COUNT, gray, layout)?;
    }

    let groups = figure.groups.len().max(1);
    let slot = BOX_GROUP_WIDTH / groups as f64;
    let half = slot * 0.4;
    let stroke = layout.px(1);
    let outlier_radius = (marker_radius(layout) * 2 / 3).max(1);

    for item in &panel.items {
        let color = figure
            .groups
            .get(item.group)
            .map(|g| g.color)
            .unwrap_or(PALETTE[0]);
        let center =
            item.category as f64 - BOX_GROUP_WIDTH / 2.0 + slot * (item.group as f64 + 0.5);
        let s = &item.stats;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(center - half, s.q3), (center + half, s.q1)],
            color.mix(0.35).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(center - half, s.q3), (center + half, s.q1)],
            color.stroke_width(stroke),
        )))?;

        let cap = half / 2.0;
        let segments = [
            vec![(center - half, s.median), (center + half, s.median)],
            vec![(center, s.q3), (center, s.whisker_high)],
            vec![(center, s.q1), (center, s.whisker_low)],
            vec![(center - cap, s.whisker_high), (center + cap, s.whisker_high)],
            vec![(center - cap, s.whisker_low), (center + cap, s.whisker_low)],
        ];
        chart.draw_series(
            segments
                .into_iter()
                .map(|pts| PathElement::new(pts, color.stroke_width(stroke))),
        )?;

        chart.draw_series(
            s.outliers
                .iter()
                .map(|v| Circle::new((center, *v), outlier_radius, color.stroke_width(stroke))),
        )?;
    }
    Ok(())
}

fn draw_reference_line<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    categories: usize,
    y: f64,
    dashes: usize,
    color: RGBColor,
    layout: &FigureLayout,
) -> Result<()> {
    let x_hi = categories.max(1) as f64 - 0.5;
    let style = color.stroke_width(layout.px(1));
    chart.draw_series(
        dashed_segments(-0.5, x_hi, dashes, 0.55)
            .into_iter()
            .map(|(a, b)| PathElement::new(vec![(a, y), (b, y)], style)),
    )?;
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    legend: &Legend,
    layout: &FigureLayout,
) -> Result<()> {
    if legend.entries.is_empty() {
        return Ok(());
    }
    let style = font(layout.font(layout.legend_font_size))
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let swatch = layout.px(26) as i32;
    let gap = layout.px(5) as i32;
    let spacing = layout.px(14) as i32;

    let title_width = match legend.title.as_deref() {
        Some(title) => area.estimate_text_size(title, &style)?.0 as i32,
        None => 0,
    };
    let mut label_widths = Vec::with_capacity(legend.entries.len());
    for entry in &legend.entries {
        label_widths.push(area.estimate_text_size(&entry.label, &style)?.0 as i32);
    }
    let total = title_width
        + label_widths
            .iter()
            .map(|w| swatch + gap + w + spacing)
            .sum::<i32>();

    let (width, height) = area.dim_in_pixel();
    let y = height as i32 / 2;
    let mut x = ((width as i32 - total) / 2).max(0);

    if let Some(title) = legend.title.as_deref() {
        area.draw_text(title, &style, (x, y))?;
        x += title_width + spacing;
    }

    let radius = marker_radius(layout);
    for (entry, label_width) in legend.entries.iter().zip(label_widths) {
        match entry.symbol {
            Some(symbol) => {
                area.draw(&PathElement::new(
                    vec![(x, y), (x + swatch, y)],
                    entry.color.stroke_width(layout.px(layout.line_width)),
                ))?;
                draw_marker(area, (x + swatch / 2, y), symbol, radius, entry.color)?;
            }
            None => {
                let half = radius.max(2);
                area.draw(&Rectangle::new(
                    [(x, y - half), (x + swatch, y + half)],
                    entry.color.mix(0.35).filled(),
                ))?;
                area.draw(&Rectangle::new(
                    [(x, y - half), (x + swatch, y + half)],
                    entry.color.stroke_width(layout.px(1)),
                ))?;
            }
        }
        area.draw_text(&entry.label, &style, (x + swatch + gap, y))?;
        x += swatch + gap + label_width + spacing;
    }
    Ok(())
}

fn marker_radius(layout: &FigureLayout) -> i32 {
    (layout.px(layout.marker_size) as i32 / 2).max(1)
}

fn draw_marker<DB, CT>(
    area: &DrawingArea<DB, CT>,
    at: CT::From,
    symbol: MarkerSymbol,
    radius: i32,
    color: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    CT: CoordTranslate,
{
    let fill = color.filled();
    match symbol {
        MarkerSymbol::Circle => {
            area.draw(&(EmptyElement::at(at) + Circle::new((0, 0), radius, fill)))?;
        }
        MarkerSymbol::Square => {
            let r = (radius as f64 * 0.85).round() as i32;
            area.draw(&(EmptyElement::at(at) + Rectangle::new([(-r, -r), (r, r)], fill)))?;
        }
        other => {
            let outline = marker_polygon(other, radius);
            area.draw(&(EmptyElement::at(at) + Polygon::new(outline, fill)))?;
        }
    }
    Ok(())
}

/// Outline of polygon markers around the origin, in pixels.
fn marker_polygon(symbol: MarkerSymbol, radius: i32) -> Vec<(i32, i32)> {
    let r = radius as f64;
    let arm = (r / 3.0).max(1.0);
    let plus = [
        (-arm, -r),
        (arm, -r),
        (arm, -arm),
        (r, -arm),
        (r, arm),
        (arm, arm),
        (arm, r),
        (-arm, r),
        (-arm, arm),
        (-r, arm),
        (-r, -arm),
        (-arm, -arm),
    ];
    let points: Vec<(f64, f64)> = match symbol {
        MarkerSymbol::Diamond => {
            let d = r * 1.2;
            vec![(0.0, -d), (d, 0.0), (0.0, d), (-d, 0.0)]
        }
        MarkerSymbol::Cross => plus.to_vec(),
        MarkerSymbol::X => {
            let c = std::f64::consts::FRAC_1_SQRT_2;
            plus.iter()
                .map(|(x, y)| ((x - y) * c, (x + y) * c))
                .collect()
        }
        MarkerSymbol::TriangleUp => vec![(0.0, -r * 1.15), (r * 1.1, r * 0.75), (-r * 1.1, r * 0.75)],
        MarkerSymbol::TriangleDown => {
            vec![(0.0, r * 1.15), (r * 1.1, -r * 0.75), (-r * 1.1, -r * 0.75)]
        }
        MarkerSymbol::Circle | MarkerSymbol::Square => {
            vec![(-r, -r), (r, -r), (r, r), (-r, r)]
        }
    };
    points
        .into_iter()
        .map(|(x, y)| (x.round() as i32, y.round() as i32))
        .collect()
}

/// Label of the category nearest to an axis position; blank between slots.
fn category_label(categories: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn format_tick(v: f64) -> String {
    let text = format!("{:.3}", v);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// `count` dashes spanning `[x0, x1]`, each covering `duty` of its period.
fn dashed_segments(x0: f64, x1: f64, count: usize, duty: f64) -> Vec<(f64, f64)> {
    let count = count.max(1);
    let period = (x1 - x0) / count as f64;
    (0..count)
        .map(|i| {
            let start = x0 + period * i as f64;
            (start, start + period * duty.clamp(0.0, 1.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_slots() {
        let cats = vec!["0.5".to_string(), "1.0".to_string()];
        assert_eq!(category_label(&cats, 0.0), "0.5");
        assert_eq!(category_label(&cats, 1.0), "1.0");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_label(&cats, -1.0), "");
    }

    #[test]
    fn ticks_drop_trailing_zeros() {
        assert_eq!(format_tick(0.950), "0.95");
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(-0.0001), "0");
        assert_eq!(format_tick(-0.125), "-0.125");
    }

    #[test]
    fn missing_values_split_the_line() {
        let points = vec![(0, 0.9), (1, f64::NAN), (2, 0.95), (3, 0.94)];
        assert_eq!(
            finite_runs(&points),
            vec![vec![(0.0, 0.9)], vec![(2.0, 0.95), (3.0, 0.94)]]
        );
        assert!(finite_runs(&[(0, f64::NAN)]).is_empty());
    }

    #[test]
    fn dashes_stay_inside_span() {
        let dashes = dashed_segments(-0.5, 4.5, 10, 0.5);
        assert_eq!(dashes.len(), 10);
        assert_eq!(dashes[0].0, -0.5);
        for (a, b) in &dashes {
            assert!(a < b);
            assert!(*b <= 4.5);
        }
    }

    #[test]
    fn polygon_markers_are_centered() {
        for symbol in [
            MarkerSymbol::Diamond,
            MarkerSymbol::Cross,
            MarkerSymbol::X,
            MarkerSymbol::TriangleUp,
            MarkerSymbol::TriangleDown,
        ] {
            let outline = marker_polygon(symbol, 10);
            assert!(outline.len() >= 3);
            for (x, y) in outline {
                assert!(x.abs() <= 13 && y.abs() <= 13, "{:?} out of bounds", symbol);
            }
        }
    }

    #[test]
    fn triangles_point_opposite_ways() {
        let up = marker_polygon(MarkerSymbol::TriangleUp, 10);
        let down = marker_polygon(MarkerSymbol::TriangleDown, 10);
        assert!(up[0].1 < 0);
        assert!(down[0].1 > 0);
    }
}
