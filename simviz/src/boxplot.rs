//! Box plots of `atet - true_effect`, faceted by bandwidth factor.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{distinct_sorted, read_simulation, sorted_bandwidths, SimulationRecord};
use crate::draw::render_box_figure;
use crate::figure::{wrapped_grid, BoxFigure, BoxItem, BoxPanel, Legend, LegendEntry};
use crate::layout::FigureLayout;
use crate::stats::BoxStats;
use crate::style::style_maps;
use crate::{Result, VizError};

pub const DEFAULT_WIDTH: u32 = 1050;
pub const DEFAULT_HEIGHT: u32 = 1050;
pub const FILE_NAME: &str = "boxplot_centered_atet.png";

const FACET_COLUMNS: usize = 2;

pub fn boxplot_centered_atet(
    csv_path: &Path,
    output_dir: &Path,
    width: u32,
    height: u32,
) -> Result<PathBuf> {
    boxplot_centered_atet_with_layout(csv_path, output_dir, width, height, &FigureLayout::default())
}

pub fn boxplot_centered_atet_with_layout(
    csv_path: &Path,
    output_dir: &Path,
    width: u32,
    height: u32,
    layout: &FigureLayout,
) -> Result<PathBuf> {
    let rows = read_simulation(csv_path)?;
    let figure = build_boxplot_figure(&rows);
    fs::create_dir_all(output_dir).map_err(|source| VizError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = output_dir.join(FILE_NAME);
    render_box_figure(&path, &figure, width, height, layout)?;
    info!("Wrote plot: {}", path.display());
    Ok(path)
}

pub fn build_boxplot_figure(rows: &[SimulationRecord]) -> BoxFigure {
    let bandwidths = sorted_bandwidths(rows.iter().map(|r| &r.bwfactor));
    let treatments = distinct_sorted(rows.iter().map(|r| r.treatment));
    let sample_sizes = distinct_sorted(rows.iter().map(|r| r.n));
    let styles = style_maps(&sample_sizes, None);
    let (grid_rows, grid_cols) = wrapped_grid(bandwidths.len(), FACET_COLUMNS);

    let panels = bandwidths
        .iter()
        .enumerate()
        .map(|(idx, bw)| {
            let mut items = Vec::new();
            for (category, &treatment) in treatments.iter().enumerate() {
                for (group, &n) in sample_sizes.iter().enumerate() {
                    let deviations: Vec<f64> = rows
                        .iter()
                        .filter(|r| &r.bwfactor == bw && r.treatment == treatment && r.n == n)
                        .map(SimulationRecord::atet_dev)
                        .collect();
                    if let Some(stats) = BoxStats::from_values(&deviations) {
                        items.push(BoxItem {
                            category,
                            group,
                            stats,
                        });
                    }
                }
            }
            let row = idx / grid_cols;
            let col = idx % grid_cols;
            BoxPanel {
                title: format!("bwfactor={}", bw),
                items,
                x_title: (row + 1 == grid_rows).then(|| "Treatment".to_string()),
                y_title: (col == 0).then(|| "ATET - True Effect".to_string()),
            }
        })
        .collect();

    let groups: Vec<LegendEntry> = sample_sizes
        .iter()
        .map(|n| LegendEntry {
            label: n.to_string(),
            color: styles.color(n),
            symbol: None,
        })
        .collect();

    BoxFigure {
        rows: grid_rows,
        cols: grid_cols,
        categories: treatments.iter().map(|t| t.to_string()).collect(),
        legend: Legend {
            title: Some("Sample Size (N)".to_string()),
            entries: groups.clone(),
        },
        groups,
        panels,
        reference_line: Some(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BandwidthFactor;

    fn row(treatment: i64, n: i64, bw: &str, atet: f64, true_effect: f64) -> SimulationRecord {
        SimulationRecord {
            treatment,
            n,
            bwfactor: BandwidthFactor::new(bw),
            atet,
            true_effect,
        }
    }

    #[test]
    fn facets_follow_numeric_bandwidth_order() {
        let rows = vec![
            row(3, 250, "2", 1.0, 1.0),
            row(3, 250, "0.5", 1.0, 1.0),
            row(3, 250, "10", 1.0, 1.0),
        ];
        let figure = build_boxplot_figure(&rows);
        let titles: Vec<&str> = figure.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["bwfactor=0.5", "bwfactor=2", "bwfactor=10"]);
        assert_eq!((figure.rows, figure.cols), (2, 2));
        assert_eq!(figure.reference_line, Some(0.0));
    }

    #[test]
    fn boxes_use_centered_deviation() {
        let rows = vec![
            row(3, 250, "1", 1.5, 1.0),
            row(3, 250, "1", 0.5, 1.0),
            row(3, 500, "1", 2.0, 1.0),
            row(4, 250, "1", 3.0, 3.0),
        ];
        let figure = build_boxplot_figure(&rows);
        assert_eq!(figure.categories, vec!["3", "4"]);
        let labels: Vec<&str> = figure.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["250", "500"]);

        let items = &figure.panels[0].items;
        assert_eq!(items.len(), 3);
        let first = &items[0];
        assert_eq!((first.category, first.group), (0, 0));
        assert_eq!(first.stats.median, 0.0);
        assert_eq!(first.stats.count, 2);
        let second = &items[1];
        assert_eq!((second.category, second.group), (0, 1));
        assert_eq!(second.stats.median, 1.0);
    }

    #[test]
    fn sample_sizes_order_numerically() {
        let rows = vec![
            row(3, 1000, "1", 0.0, 0.0),
            row(3, 250, "1", 0.0, 0.0),
            row(3, 500, "1", 0.0, 0.0),
        ];
        let figure = build_boxplot_figure(&rows);
        let labels: Vec<&str> = figure.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["250", "500", "1000"]);
        assert_eq!(figure.groups[0].color, crate::style::PALETTE[0]);
        assert_eq!(figure.legend.entries, figure.groups);
    }

    #[test]
    fn axis_titles_on_outer_facets() {
        let rows = vec![
            row(3, 250, "1", 0.0, 0.0),
            row(3, 250, "2", 0.0, 0.0),
            row(3, 250, "3", 0.0, 0.0),
        ];
        let figure = build_boxplot_figure(&rows);
        assert!(figure.panels[0].x_title.is_none());
        assert!(figure.panels[0].y_title.is_some());
        assert!(figure.panels[1].y_title.is_none());
        assert!(figure.panels[2].x_title.is_some());
    }

    #[test]
    fn empty_input_has_no_facets() {
        let figure = build_boxplot_figure(&[]);
        assert!(figure.panels.is_empty());
        assert_eq!(figure.y_range(), (-0.5, 0.5));
    }
}
