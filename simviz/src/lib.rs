//! Static charts for simulation summaries of treatment-effect estimators.
//!
//! The crate reads pre-aggregated simulation tables from CSV and renders
//! PNG figures: per-treatment metric grids, per-metric rows across sample
//! sizes, and box plots of the centered ATET.

use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

mod backend;
pub mod boxplot;
pub mod config;
pub mod data;
mod draw;
pub mod figure;
pub mod layout;
pub mod metrics;
pub mod stats;
pub mod style;
pub mod summary;

pub use boxplot::{boxplot_centered_atet, boxplot_centered_atet_with_layout};
pub use config::{run_all, BoxplotJob, MetricsJob, RunConfig, SummaryJob};
pub use data::{BandwidthFactor, Metric, SimulationRecord, SummaryRecord};
pub use layout::FigureLayout;
pub use metrics::{plot_metrics, plot_metrics_with_layout};
pub use stats::BoxStats;
pub use style::{style_maps, MarkerSymbol, StyleMaps};
pub use summary::{plot_summary, plot_summary_with_layout};

#[derive(Error, Debug)]
pub enum VizError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid run config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("drawing error: {0}")]
    Drawing(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for VizError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        VizError::Drawing(err.to_string())
    }
}

pub type Result<T, E = VizError> = std::result::Result<T, E>;
