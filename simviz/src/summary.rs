//! Per-treatment 2x2 grid of bias, standard deviation, RMSE and coverage.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::data::{distinct_sorted, first_appearance, read_summary, Metric, SummaryRecord};
use crate::draw::render_line_figure;
use crate::figure::{Legend, LegendEntry, LineFigure, LinePanel, LineTrace};
use crate::layout::FigureLayout;
use crate::style::style_maps;
use crate::{Result, VizError};

pub const DEFAULT_WIDTH: u32 = 850;
pub const DEFAULT_HEIGHT: u32 = 600;

const X_TITLE: &str = "Bandwidth Factor";
const LEGEND_TITLE: &str = "Sample Size (N)";

pub fn summary_file_name(treatment: i64, control: i64) -> String {
    format!("summary_t{}_c{}.png", treatment, control)
}

/// Renders `summary_t{treatment}_c{control}.png` for every treatment.
///
/// Returns the written paths in the order of `treatments`.
pub fn plot_summary(
    csv_path: &Path,
    output_dir: &Path,
    treatments: &[i64],
    control: i64,
    width: u32,
    height: u32,
) -> Result<Vec<PathBuf>> {
    plot_summary_with_layout(
        csv_path,
        output_dir,
        treatments,
        control,
        width,
        height,
        &FigureLayout::default(),
    )
}

pub fn plot_summary_with_layout(
    csv_path: &Path,
    output_dir: &Path,
    treatments: &[i64],
    control: i64,
    width: u32,
    height: u32,
    layout: &FigureLayout,
) -> Result<Vec<PathBuf>> {
    let rows = read_summary(csv_path)?;
    fs::create_dir_all(output_dir).map_err(|source| VizError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(treatments.len());
    for &treatment in treatments {
        let figure = build_summary_figure(&rows, treatment, control);
        if figure.trace_count() == 0 {
            debug!(
                "No rows for treatment={} control={}; writing empty grid",
                treatment, control
            );
        }
        let path = output_dir.join(summary_file_name(treatment, control));
        render_line_figure(&path, &figure, width, height, layout)?;
        info!("Wrote plot: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Builds the 2x2 grid for one treatment/control pair.
pub fn build_summary_figure(rows: &[SummaryRecord], treatment: i64, control: i64) -> LineFigure {
    let subset: Vec<&SummaryRecord> = rows
        .iter()
        .filter(|r| r.treatment == treatment && r.control == control)
        .collect();
    let sample_sizes = distinct_sorted(subset.iter().map(|r| r.n));
    let categories: Vec<String> = first_appearance(
        sample_sizes
            .iter()
            .flat_map(|n| subset.iter().filter(move |r| r.n == *n))
            .map(|r| r.bwfactor.label().to_string()),
    );
    let styles = style_maps(&sample_sizes, None);

    let panels = Metric::ALL
        .iter()
        .enumerate()
        .map(|(idx, &metric)| {
            let traces = sample_sizes
                .iter()
                .filter_map(|n| {
                    let points: Vec<(usize, f64)> = subset
                        .iter()
                        .filter(|r| r.n == *n)
                        .filter_map(|r| {
                            let slot = categories.iter().position(|c| c == r.bwfactor.label())?;
                            Some((slot, metric.value(r)))
                        })
                        .collect();
                    if points.is_empty() {
                        return None;
                    }
                    Some(LineTrace {
                        label: format!("N={}", n),
                        color: styles.color(n),
                        symbol: styles.symbol(n),
                        points,
                    })
                })
                .collect();
            LinePanel {
                title: metric.title().to_string(),
                categories: categories.clone(),
                traces,
                x_title: (idx >= 2).then(|| X_TITLE.to_string()),
                y_title: Some(metric.title().to_string()),
                reference_line: metric.reference_line(),
            }
        })
        .collect();

    let entries = sample_sizes
        .iter()
        .map(|n| LegendEntry {
            label: format!("N={}", n),
            color: styles.color(n),
            symbol: Some(styles.symbol(n)),
        })
        .collect();

    LineFigure {
        rows: 2,
        cols: 2,
        panels,
        shared_y: false,
        legend: Legend {
            title: Some(LEGEND_TITLE.to_string()),
            entries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BandwidthFactor;

    fn row(treatment: i64, control: i64, n: i64, bw: &str, bias: f64) -> SummaryRecord {
        SummaryRecord {
            treatment,
            control,
            n,
            bwfactor: BandwidthFactor::new(bw),
            bias,
            se: 0.2,
            rmse: 0.3,
            coverage_rate: 0.9,
        }
    }

    #[test]
    fn file_name_scheme() {
        assert_eq!(summary_file_name(3, 2), "summary_t3_c2.png");
    }

    #[test]
    fn one_trace_per_sample_size_with_signed_bias() {
        let rows = vec![
            row(3, 2, 500, "0.5", -0.2),
            row(3, 2, 250, "0.5", -0.1),
            row(3, 2, 250, "1.0", 0.1),
            row(3, 1, 250, "1.0", 9.0),
            row(4, 2, 250, "1.0", 9.0),
        ];
        let figure = build_summary_figure(&rows, 3, 2);
        assert_eq!(figure.panels.len(), 4);
        let bias = &figure.panels[0];
        assert_eq!(bias.title, "Bias");
        assert_eq!(bias.categories, vec!["0.5", "1.0"]);
        let labels: Vec<&str> = bias.traces.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["N=250", "N=500"]);
        assert_eq!(bias.traces[0].points, vec![(0, -0.1), (1, 0.1)]);
        assert_eq!(bias.traces[1].points, vec![(0, -0.2)]);
        assert_eq!(figure.legend.entries.len(), 2);
        assert!(!figure.shared_y);
    }

    #[test]
    fn categories_follow_trace_order() {
        let rows = vec![
            row(3, 2, 500, "1.5", 0.0),
            row(3, 2, 250, "0.5", 0.0),
            row(3, 2, 250, "1.5", 0.0),
        ];
        let figure = build_summary_figure(&rows, 3, 2);
        assert_eq!(figure.panels[0].categories, vec!["0.5", "1.5"]);
        assert_eq!(figure.panels[0].traces[1].points, vec![(1, 0.0)]);
    }

    #[test]
    fn only_coverage_has_reference_line() {
        let figure = build_summary_figure(&[row(3, 2, 250, "1", 0.0)], 3, 2);
        let lines: Vec<Option<f64>> = figure.panels.iter().map(|p| p.reference_line).collect();
        assert_eq!(lines, vec![None, None, None, Some(0.95)]);
        assert!(figure.panels[0].x_title.is_none());
        assert_eq!(figure.panels[3].x_title.as_deref(), Some("Bandwidth Factor"));
    }

    #[test]
    fn absent_treatment_yields_empty_grid() {
        let figure = build_summary_figure(&[row(3, 2, 250, "1", 0.0)], 9, 2);
        assert_eq!(figure.panels.len(), 4);
        assert_eq!(figure.trace_count(), 0);
        assert!(figure.legend.entries.is_empty());
    }
}
