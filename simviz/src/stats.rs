use std::cmp::Ordering;

const WHISKER_IQR: f64 = 1.5;

/// Five-number summary with Tukey whiskers.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest observation within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Largest observation within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

impl BoxStats {
    /// Non-finite values are ignored; `None` when nothing is left.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let q1 = percentile_of_sorted(&sorted, 0.25);
        let median = percentile_of_sorted(&sorted, 0.5);
        let q3 = percentile_of_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let inliers = sorted
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence);
        let whisker_low = inliers.clone().fold(f64::INFINITY, f64::min).min(q1);
        let whisker_high = inliers.fold(f64::NEG_INFINITY, f64::max).max(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
            count: sorted.len(),
        })
    }

    /// Lowest and highest point drawn for this box.
    pub fn extent(&self) -> (f64, f64) {
        let lo = self
            .outliers
            .iter()
            .copied()
            .fold(self.whisker_low, f64::min);
        let hi = self
            .outliers
            .iter()
            .copied()
            .fold(self.whisker_high, f64::max);
        (lo, hi)
    }
}

/// Linear interpolation between order statistics at position `p * (n - 1)`.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_interpolate() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.count, 4);
        assert!(stats.outliers.is_empty());
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
    }

    #[test]
    fn far_points_become_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0, -50.0];
        let stats = BoxStats::from_values(&values).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![-50.0, 100.0]);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);
        assert_eq!(stats.extent(), (-50.0, 100.0));
    }

    #[test]
    fn single_value_collapses() {
        let stats = BoxStats::from_values(&[0.25]).unwrap();
        assert_eq!(stats.q1, 0.25);
        assert_eq!(stats.q3, 0.25);
        assert_eq!(stats.whisker_low, 0.25);
        assert_eq!(stats.whisker_high, 0.25);
    }

    #[test]
    fn empty_and_non_finite_input() {
        assert!(BoxStats::from_values(&[]).is_none());
        assert!(BoxStats::from_values(&[f64::NAN, f64::INFINITY]).is_none());
        let stats = BoxStats::from_values(&[f64::NAN, 2.0]).unwrap();
        assert_eq!(stats.count, 1);
    }
}
