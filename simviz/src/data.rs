//! Input tables and the category helpers shared by the plotters.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::{Result, VizError};

/// Bandwidth factor as it appears in the CSV.
///
/// The text is kept verbatim for display so the axis is categorical;
/// the numeric value is only used for ordering facets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BandwidthFactor {
    label: String,
}

impl BandwidthFactor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into().trim().to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> Option<f64> {
        self.label.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Numeric order; labels that do not parse sort after numbers.
    pub fn numeric_cmp(&self, other: &Self) -> Ordering {
        let key = |bw: &Self| bw.value().map(OrderedFloat);
        match (key(self), key(other)) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.label.cmp(&other.label)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.label.cmp(&other.label),
        }
    }
}

impl From<String> for BandwidthFactor {
    fn from(value: String) -> Self {
        BandwidthFactor::new(value)
    }
}

impl From<BandwidthFactor> for String {
    fn from(value: BandwidthFactor) -> Self {
        value.label
    }
}

impl From<&str> for BandwidthFactor {
    fn from(value: &str) -> Self {
        BandwidthFactor::new(value)
    }
}

impl fmt::Display for BandwidthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// One row of the aggregated summary table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub treatment: i64,
    pub control: i64,
    #[serde(rename = "N")]
    pub n: i64,
    pub bwfactor: BandwidthFactor,
    #[serde(deserialize_with = "empty_as_nan")]
    pub bias: f64,
    #[serde(deserialize_with = "empty_as_nan")]
    pub se: f64,
    #[serde(deserialize_with = "empty_as_nan")]
    pub rmse: f64,
    #[serde(deserialize_with = "empty_as_nan")]
    pub coverage_rate: f64,
}

/// One replication-level row used for the centered ATET box plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub treatment: i64,
    #[serde(rename = "N")]
    pub n: i64,
    pub bwfactor: BandwidthFactor,
    #[serde(deserialize_with = "empty_as_nan")]
    pub atet: f64,
    #[serde(deserialize_with = "empty_as_nan")]
    pub true_effect: f64,
}

/// Blank numeric cells read as NaN so one missing value only drops its point.
fn empty_as_nan<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl SimulationRecord {
    /// Deviation of the estimate from the true effect.
    pub fn atet_dev(&self) -> f64 {
        self.atet - self.true_effect
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Bias,
    Se,
    Rmse,
    CoverageRate,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Bias, Metric::Se, Metric::Rmse, Metric::CoverageRate];

    /// Column name, also used for output file names.
    pub fn id(self) -> &'static str {
        match self {
            Metric::Bias => "bias",
            Metric::Se => "se",
            Metric::Rmse => "rmse",
            Metric::CoverageRate => "coverage_rate",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Bias => "Bias",
            Metric::Se => "Standard Deviation",
            Metric::Rmse => "RMSE",
            Metric::CoverageRate => "Coverage Rate",
        }
    }

    /// Nominal target drawn as a horizontal reference line.
    pub fn reference_line(self) -> Option<f64> {
        match self {
            Metric::CoverageRate => Some(0.95),
            _ => None,
        }
    }

    pub fn value(self, record: &SummaryRecord) -> f64 {
        match self {
            Metric::Bias => record.bias,
            Metric::Se => record.se,
            Metric::Rmse => record.rmse,
            Metric::CoverageRate => record.coverage_rate,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let csv_err = |source| VizError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_err)?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn read_summary(path: &Path) -> Result<Vec<SummaryRecord>> {
    read_records(path)
}

pub fn read_simulation(path: &Path) -> Result<Vec<SimulationRecord>> {
    read_records(path)
}

/// Distinct values in ascending order.
pub fn distinct_sorted<T, I>(values: I) -> Vec<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct values in order of first appearance.
pub fn first_appearance<T, I>(values: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut out: Vec<T> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

pub fn sorted_bandwidths<'a, I>(values: I) -> Vec<BandwidthFactor>
where
    I: IntoIterator<Item = &'a BandwidthFactor>,
{
    let mut out = first_appearance(values.into_iter().cloned());
    out.sort_by(|a, b| a.numeric_cmp(b));
    out
}
