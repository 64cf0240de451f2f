//! Backend-independent description of the figures.
//!
//! The plotters build these from the CSV rows; `draw` turns them into
//! pixels. Keeping the two apart lets tests inspect exactly what would be
//! plotted.

use plotters::style::RGBColor;

use crate::stats::BoxStats;
use crate::style::MarkerSymbol;

/// One line+marker series on a categorical x axis.
#[derive(Clone, Debug)]
pub struct LineTrace {
    pub label: String,
    pub color: RGBColor,
    pub symbol: MarkerSymbol,
    /// `(category index, value)` pairs in drawing order.
    pub points: Vec<(usize, f64)>,
}

#[derive(Clone, Debug)]
pub struct LinePanel {
    pub title: String,
    pub categories: Vec<String>,
    pub traces: Vec<LineTrace>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub reference_line: Option<f64>,
}

impl LinePanel {
    /// Min/max over traces and the reference line.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let values = self
            .traces
            .iter()
            .flat_map(|t| t.points.iter().map(|(_, y)| *y))
            .chain(self.reference_line);
        bounds(values)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: RGBColor,
    pub symbol: Option<MarkerSymbol>,
}

#[derive(Clone, Debug, Default)]
pub struct Legend {
    pub title: Option<String>,
    pub entries: Vec<LegendEntry>,
}

/// Grid of line panels filled row by row.
#[derive(Clone, Debug)]
pub struct LineFigure {
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<LinePanel>,
    /// Same y range on every panel.
    pub shared_y: bool,
    pub legend: Legend,
}

impl LineFigure {
    pub fn trace_count(&self) -> usize {
        self.panels.iter().map(|p| p.traces.len()).sum()
    }

    pub fn y_range(&self, panel: &LinePanel) -> (f64, f64) {
        let raw = if self.shared_y {
            bounds(self.panels.iter().filter_map(|p| p.value_bounds()).flat_map(|(a, b)| [a, b]))
        } else {
            panel.value_bounds()
        };
        padded(raw)
    }
}

/// Boxes for one x category and one group.
#[derive(Clone, Debug)]
pub struct BoxItem {
    pub category: usize,
    pub group: usize,
    pub stats: BoxStats,
}

#[derive(Clone, Debug)]
pub struct BoxPanel {
    pub title: String,
    pub items: Vec<BoxItem>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
}

/// Faceted grouped box plot sharing x categories and y range.
#[derive(Clone, Debug)]
pub struct BoxFigure {
    pub rows: usize,
    pub cols: usize,
    pub categories: Vec<String>,
    pub groups: Vec<LegendEntry>,
    pub panels: Vec<BoxPanel>,
    pub reference_line: Option<f64>,
    pub legend: Legend,
}

impl BoxFigure {
    pub fn y_range(&self) -> (f64, f64) {
        let values = self
            .panels
            .iter()
            .flat_map(|p| p.items.iter())
            .flat_map(|item| {
                let (lo, hi) = item.stats.extent();
                [lo, hi]
            })
            .chain(self.reference_line);
        padded(bounds(values))
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Adds 5% headroom on both sides; degenerate ranges get a unit span.
fn padded(raw: Option<(f64, f64)>) -> (f64, f64) {
    match raw {
        None => (0.0, 1.0),
        Some((lo, hi)) if (hi - lo).abs() < 1e-12 => {
            let half = if lo.abs() > 1e-12 { lo.abs() * 0.1 } else { 0.5 };
            (lo - half, hi + half)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

/// Grid shape for `count` facets wrapped into `cols` columns.
pub fn wrapped_grid(count: usize, cols: usize) -> (usize, usize) {
    let cols = cols.max(1);
    let rows = count.div_ceil(cols).max(1);
    (rows, cols)
}
