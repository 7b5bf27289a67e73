//! Linear regression over (mileage, price) samples.
//!
//! Treated as a pure numeric routine by the valuation workflow: fit a
//! least-squares line through the samples, predict at one point. No
//! weighting, no outlier handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("regression needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    /// All x values identical: the slope is undefined.
    #[error("regression samples have no variance in x")]
    DegenerateInput,
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Ordinary least-squares fit over (x, y) samples.
    pub fn fit(samples: &[(f64, f64)]) -> Result<Self, RegressionError> {
        if samples.len() < 2 {
            return Err(RegressionError::TooFewSamples(samples.len()));
        }

        let n = samples.len() as f64;
        let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;

        let covariance: f64 = samples
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();
        let variance: f64 = samples.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();

        if variance == 0.0 {
            return Err(RegressionError::DegenerateInput);
        }

        let slope = covariance / variance;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_exact_line() {
        let samples = [(0.0, 10.0), (1.0, 8.0), (2.0, 6.0)];
        let model = LinearModel::fit(&samples).unwrap();

        assert!((model.slope - (-2.0)).abs() < 1e-9);
        assert!((model.intercept - 10.0).abs() < 1e-9);
        assert!((model.predict(3.0) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn fits_noisy_depreciation_curve() {
        // Price drops roughly 50 per km of mileage.
        let samples = [
            (20_000.0, 9_100_000.0),
            (45_000.0, 7_800_000.0),
            (80_000.0, 6_200_000.0),
            (120_000.0, 4_000_000.0),
        ];
        let model = LinearModel::fit(&samples).unwrap();

        assert!(model.slope < 0.0);
        let predicted = model.predict(60_000.0);
        assert!(predicted > 6_200_000.0 && predicted < 7_800_000.0);
    }

    #[test]
    fn rejects_single_sample() {
        let err = LinearModel::fit(&[(1.0, 2.0)]).unwrap_err();
        assert!(matches!(err, RegressionError::TooFewSamples(1)));
    }

    #[test]
    fn rejects_zero_variance() {
        let err = LinearModel::fit(&[(5.0, 1.0), (5.0, 2.0), (5.0, 3.0)]).unwrap_err();
        assert!(matches!(err, RegressionError::DegenerateInput));
    }
}
