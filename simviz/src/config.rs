//! Run file describing a full rendering pass.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::layout::FigureLayout;
use crate::{boxplot, metrics, summary, Result, VizError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryJob {
    pub csv: PathBuf,
    pub treatments: Vec<i64>,
    pub control: i64,
    pub width: u32,
    pub height: u32,
}

impl Default for SummaryJob {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("./visualization/csv/summary.csv"),
            treatments: vec![3, 4, 5, 6, 7],
            control: 2,
            width: summary::DEFAULT_WIDTH,
            height: summary::DEFAULT_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsJob {
    pub csv: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for MetricsJob {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("./visualization/csv/summary.csv"),
            width: metrics::DEFAULT_WIDTH,
            height: metrics::DEFAULT_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxplotJob {
    pub csv: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for BoxplotJob {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("./visualization/csv/non_null_simulation_results.csv"),
            width: boxplot::DEFAULT_WIDTH,
            height: boxplot::DEFAULT_HEIGHT,
        }
    }
}

/// All three plotters writing into one output directory.
///
/// Jobs set to `null` in the run file are skipped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub summary: Option<SummaryJob>,
    pub metrics: Option<MetricsJob>,
    pub boxplot: Option<BoxplotJob>,
    pub layout: FigureLayout,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./visualization/png"),
            summary: Some(SummaryJob::default()),
            metrics: Some(MetricsJob::default()),
            boxplot: Some(BoxplotJob::default()),
            layout: FigureLayout::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| VizError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| VizError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runs every configured job in order and returns the written files.
pub fn run_all(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let out = config.output_dir.as_path();
    let mut written = Vec::new();
    if let Some(job) = config.summary.as_ref() {
        written.extend(summary::plot_summary_with_layout(
            &job.csv,
            out,
            &job.treatments,
            job.control,
            job.width,
            job.height,
            &config.layout,
        )?);
    }
    if let Some(job) = config.metrics.as_ref() {
        written.extend(metrics::plot_metrics_with_layout(
            &job.csv,
            out,
            job.width,
            job.height,
            &config.layout,
        )?);
    }
    if let Some(job) = config.boxplot.as_ref() {
        written.push(boxplot::boxplot_centered_atet_with_layout(
            &job.csv,
            out,
            job.width,
            job.height,
            &config.layout,
        )?);
    }
    info!("Rendered {} figures into {}", written.len(), out.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_invocation() {
        let config = RunConfig::default();
        let summary = config.summary.unwrap();
        assert_eq!(summary.treatments, vec![3, 4, 5, 6, 7]);
        assert_eq!(summary.control, 2);
        assert_eq!((summary.width, summary.height), (850, 600));
        let metrics = config.metrics.unwrap();
        assert_eq!((metrics.width, metrics.height), (1000, 325));
        let boxplot = config.boxplot.unwrap();
        assert_eq!((boxplot.width, boxplot.height), (1050, 1050));
    }

    #[test]
    fn partial_json_fills_defaults_and_null_skips() {
        let config: RunConfig = serde_json::from_str(
            r#"{"output_dir": "out", "summary": {"treatments": [3]}, "boxplot": null}"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        let summary = config.summary.unwrap();
        assert_eq!(summary.treatments, vec![3]);
        assert_eq!(summary.control, 2);
        assert!(config.metrics.is_some());
        assert!(config.boxplot.is_none());
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{ not json").unwrap();
        let err = RunConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, VizError::Config { .. }));
        assert!(err.to_string().contains("run.json"));
    }
}
