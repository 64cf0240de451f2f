//! One figure per metric: a row of panels, one per sample size, one line
//! per treatment, sharing the y axis.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{distinct_sorted, first_appearance, read_summary, Metric, SummaryRecord};
use crate::draw::render_line_figure;
use crate::figure::{Legend, LegendEntry, LineFigure, LinePanel, LineTrace};
use crate::layout::FigureLayout;
use crate::style::style_maps;
use crate::{Result, VizError};

pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 325;

pub fn metric_file_name(metric: Metric) -> String {
    format!("{}.png", metric.id())
}

/// Bias is reported as magnitude; the other metrics are plotted as read.
pub fn plotted_value(metric: Metric, record: &SummaryRecord) -> f64 {
    match metric {
        Metric::Bias => record.bias.abs(),
        other => other.value(record),
    }
}

pub fn plotted_title(metric: Metric) -> &'static str {
    match metric {
        Metric::Bias => "Absolute Bias",
        other => other.title(),
    }
}

/// Renders `bias.png`, `se.png`, `rmse.png` and `coverage_rate.png`.
pub fn plot_metrics(
    csv_path: &Path,
    output_dir: &Path,
    width: u32,
    height: u32,
) -> Result<Vec<PathBuf>> {
    plot_metrics_with_layout(csv_path, output_dir, width, height, &FigureLayout::default())
}

pub fn plot_metrics_with_layout(
    csv_path: &Path,
    output_dir: &Path,
    width: u32,
    height: u32,
    layout: &FigureLayout,
) -> Result<Vec<PathBuf>> {
    let rows = read_summary(csv_path)?;
    fs::create_dir_all(output_dir).map_err(|source| VizError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let figure = build_metric_figure(&rows, metric);
        let path = output_dir.join(metric_file_name(metric));
        render_line_figure(&path, &figure, width, height, layout)?;
        info!("Wrote plot: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn build_metric_figure(rows: &[SummaryRecord], metric: Metric) -> LineFigure {
    let treatments = distinct_sorted(rows.iter().map(|r| r.treatment));
    let sample_sizes = distinct_sorted(rows.iter().map(|r| r.n));
    let styles = style_maps(&treatments, None);
    let title = plotted_title(metric);

    let panels: Vec<LinePanel> = sample_sizes
        .iter()
        .map(|&n| {
            let cell_rows: Vec<&SummaryRecord> = rows.iter().filter(|r| r.n == n).collect();
            let categories: Vec<String> = first_appearance(
                treatments
                    .iter()
                    .flat_map(|t| cell_rows.iter().filter(move |r| r.treatment == *t))
                    .map(|r| r.bwfactor.label().to_string()),
            );
            let traces = treatments
                .iter()
                .filter_map(|t| {
                    let points: Vec<(usize, f64)> = cell_rows
                        .iter()
                        .filter(|r| r.treatment == *t)
                        .filter_map(|r| {
                            let slot = categories.iter().position(|c| c == r.bwfactor.label())?;
                            Some((slot, plotted_value(metric, r)))
                        })
                        .collect();
                    if points.is_empty() {
                        return None;
                    }
                    Some(LineTrace {
                        label: format!("Treatment={}", t),
                        color: styles.color(t),
                        symbol: styles.symbol(t),
                        points,
                    })
                })
                .collect();
            LinePanel {
                title: format!("N = {}", n),
                categories,
                traces,
                x_title: Some("Bandwidth Factor".to_string()),
                y_title: Some(title.to_string()),
                reference_line: metric.reference_line(),
            }
        })
        .collect();

    let entries = treatments
        .iter()
        .map(|t| LegendEntry {
            label: format!("Treatment={}", t),
            color: styles.color(t),
            symbol: Some(styles.symbol(t)),
        })
        .collect();

    LineFigure {
        rows: 1,
        cols: panels.len().max(1),
        panels,
        shared_y: true,
        legend: Legend {
            title: None,
            entries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BandwidthFactor;

    fn row(treatment: i64, n: i64, bw: &str, bias: f64, se: f64) -> SummaryRecord {
        SummaryRecord {
            treatment,
            control: 2,
            n,
            bwfactor: BandwidthFactor::new(bw),
            bias,
            se,
            rmse: -1.0,
            coverage_rate: 0.94,
        }
    }

    fn values(figure: &LineFigure) -> Vec<f64> {
        figure
            .panels
            .iter()
            .flat_map(|p| p.traces.iter())
            .flat_map(|t| t.points.iter().map(|(_, y)| *y))
            .collect()
    }

    #[test]
    fn abs_applies_to_bias_only() {
        let rows = vec![row(3, 250, "0.5", -0.4, -0.1), row(4, 250, "0.5", 0.2, 0.3)];
        assert_eq!(values(&build_metric_figure(&rows, Metric::Bias)), vec![0.4, 0.2]);
        assert_eq!(values(&build_metric_figure(&rows, Metric::Se)), vec![-0.1, 0.3]);
        assert_eq!(values(&build_metric_figure(&rows, Metric::Rmse)), vec![-1.0, -1.0]);
        assert_eq!(plotted_title(Metric::Bias), "Absolute Bias");
        assert_eq!(plotted_title(Metric::Se), "Standard Deviation");
    }

    #[test]
    fn one_panel_per_sample_size_with_shared_axis() {
        let rows = vec![
            row(3, 1000, "0.5", 0.1, 0.1),
            row(3, 250, "0.5", 0.1, 0.1),
            row(4, 500, "1.0", 0.1, 0.1),
        ];
        let figure = build_metric_figure(&rows, Metric::CoverageRate);
        assert!(figure.shared_y);
        assert_eq!(figure.cols, 3);
        let titles: Vec<&str> = figure.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["N = 250", "N = 500", "N = 1000"]);
        assert!(figure.panels.iter().all(|p| p.reference_line == Some(0.95)));
        assert_eq!(figure.legend.entries.len(), 2);
        // treatment 4 has no rows at N = 250
        assert_eq!(figure.panels[0].traces.len(), 1);
        assert!(figure
            .panels
            .iter()
            .all(|p| p.y_title.as_deref() == Some("Coverage Rate")));
    }

    #[test]
    fn categories_follow_trace_order() {
        let rows = vec![
            row(4, 250, "1.5", 0.1, 0.1),
            row(3, 250, "0.5", 0.1, 0.1),
            row(3, 250, "1.5", 0.1, 0.1),
        ];
        let figure = build_metric_figure(&rows, Metric::Se);
        assert_eq!(figure.panels[0].categories, vec!["0.5", "1.5"]);
    }

    #[test]
    fn file_names_follow_metric_ids() {
        let names: Vec<String> = Metric::ALL.iter().map(|m| metric_file_name(*m)).collect();
        assert_eq!(names, vec!["bias.png", "se.png", "rmse.png", "coverage_rate.png"]);
    }
}
