use crate::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Standard deviations at or below this are treated as zero variance
pub const MIN_STD: f64 = 1e-12;

/// Per-column mean and population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureStats {
    /// Compute statistics over rows of equal width
    pub fn compute(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(ClusterError::EmptyDataset)?;
        let n_features = first.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0f64; n_features];
        for row in rows {
            if row.len() != n_features {
                return Err(ClusterError::DimensionMismatch {
                    expected: n_features,
                    actual: row.len(),
                });
            }
            for (mean, &value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n;
        }

        let mut variances = vec![0.0f64; n_features];
        for row in rows {
            for (i, &value) in row.iter().enumerate() {
                let diff = value - means[i];
                variances[i] += diff * diff;
            }
        }

        let stds = variances.into_iter().map(|v| (v / n).sqrt()).collect();

        Ok(Self { means, stds })
    }

    /// Indices of columns whose standard deviation is effectively zero
    pub fn degenerate_columns(&self) -> Vec<usize> {
        self.stds
            .iter()
            .enumerate()
            .filter(|(_, &s)| !(s > MIN_STD))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Frozen z-score scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    stats: FeatureStats,
}

impl ScalerState {
    /// Fit on encoded training rows.
    ///
    /// `names` labels the columns for error reporting. Fails with
    /// `DegenerateFeature` on the first zero-variance column.
    pub fn fit(rows: &[Vec<f64>], names: &[String]) -> Result<Self> {
        info!("Fitting scaler on {} rows", rows.len());
        let stats = FeatureStats::compute(rows)?;

        if let Some(&idx) = stats.degenerate_columns().first() {
            let name = names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("column {}", idx));
            return Err(ClusterError::DegenerateFeature(name));
        }

        debug!("Scaler means: {:?}", stats.means);
        Ok(Self { stats })
    }

    pub fn from_stats(stats: FeatureStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &FeatureStats {
        &self.stats
    }

    pub fn n_features(&self) -> usize {
        self.stats.means.len()
    }

    fn check_width(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.n_features() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        Ok(())
    }

    /// `(x - mean) / std` per feature
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_width(features)?;
        Ok(features
            .iter()
            .zip(self.stats.means.iter().zip(&self.stats.stds))
            .map(|(&x, (&mean, &std))| (x - mean) / std)
            .collect())
    }

    /// `x * std + mean` per feature
    pub fn inverse_transform(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        self.check_width(scaled)?;
        Ok(scaled
            .iter()
            .zip(self.stats.means.iter().zip(&self.stats.stds))
            .map(|(&z, (&mean, &std))| z * std + mean)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
