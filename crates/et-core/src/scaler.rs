//! Per-feature standardisation.

use serde::{Deserialize, Serialize};

/// Centres each feature on its training mean and scales it by the training
/// standard deviation.
///
/// Constant features get a scale of 1 so they pass through centred but
/// unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fits means and population standard deviations over `rows`.
    ///
    /// Returns `None` when `rows` is empty.
    #[expect(
        clippy::cast_precision_loss,
        reason = "training sets are far below 2^52 rows"
    )]
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Option<Self> {
        let width = rows.first()?.as_ref().len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row.as_ref()) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((var, value), mean) in scales.iter_mut().zip(row.as_ref()).zip(&means) {
                *var += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std = (*scale / n).sqrt();
            *scale = if std > f64::EPSILON { std } else { 1.0 };
        }

        Some(Self { means, scales })
    }

    /// Number of features the scaler was fitted on.
    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Standardises one row.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((value, mean), scale)| (value - mean) / scale)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_on_empty_returns_none() {
        let rows: Vec<Vec<f64>> = Vec::new();
        assert!(StandardScaler::fit(&rows).is_none());
    }

    #[test]
    fn transform_centres_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.width(), 2);

        let scaled = scaler.transform(&[1.0, 10.0]);
        assert!((scaled[0] + 1.0).abs() < 1e-12);
        // Constant column is centred but not divided by zero.
        assert!(scaled[1].abs() < 1e-12);

        let scaled = scaler.transform(&[5.0, 12.0]);
        assert!((scaled[0] - 3.0).abs() < 1e-12);
        assert!((scaled[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fitted_rows_have_zero_mean_unit_variance() {
        let rows = vec![[2.0], [4.0], [4.0], [4.0], [5.0], [5.0], [7.0], [9.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled: Vec<f64> = rows.iter().map(|r| scaler.transform(r)[0]).collect();
        let mean = scaled.iter().sum::<f64>() / 8.0;
        let var = scaled.iter().map(|v| v * v).sum::<f64>() / 8.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }
}
