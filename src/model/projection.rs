//! Principal component projection fitted by symmetric eigendecomposition
//! of the sample covariance

use crate::{ClusterError, Result};
use faer::{Mat, Side};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Frozen linear projection: centering plus a k x d orthonormal basis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionState {
    /// Column means of the fitted matrix
    pub mean: Vec<f64>,
    /// Principal axes, one row per component, by decreasing variance
    pub components: Vec<Vec<f64>>,
    /// Variance captured by each component
    pub explained_variance: Vec<f64>,
    /// Total variance of the fitted matrix
    pub total_variance: f64,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn array_to_faer(array: &Array2<f64>) -> Mat<f64> {
    let (rows, cols) = array.dim();
    Mat::from_fn(rows, cols, |i, j| array[[i, j]])
}

/// Eigenpairs of a symmetric matrix, largest eigenvalue first
fn eigh_descending(matrix: &Array2<f64>) -> Result<Vec<(f64, Vec<f64>)>> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::Projection(
            "covariance contains non-finite entries".to_string(),
        ));
    }

    let d = matrix.nrows();
    let faer_matrix = array_to_faer(matrix);
    let eig = faer_matrix
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| ClusterError::Projection(format!("eigendecomposition failed: {:?}", e)))?;

    let values = eig.S();
    let vectors = eig.U();
    let mut pairs: Vec<(f64, Vec<f64>)> = (0..d)
        .map(|j| (values[j], (0..d).map(|i| vectors[(i, j)]).collect()))
        .collect();
    // stable: equal eigenvalues keep the solver's order
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(pairs)
}

impl ProjectionState {
    /// Fit the top `n_components` principal axes of `rows`.
    pub fn fit(rows: &[Vec<f64>], n_components: usize) -> Result<Self> {
        let k = n_components;
        let n = rows.len();
        let d = rows.first().map_or(0, Vec::len);

        if n < 2 || k > n {
            return Err(ClusterError::Projection(format!(
                "need at least max(2, {}) rows, got {}",
                k, n
            )));
        }
        if k == 0 || k > d {
            return Err(ClusterError::Projection(format!(
                "cannot extract {} components from {} features",
                k, d
            )));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != d) {
            return Err(ClusterError::DimensionMismatch {
                expected: d,
                actual: row.len(),
            });
        }

        info!("Fitting projection: {} rows x {} features -> {} components", n, d, k);

        let data = Array2::from_shape_fn((n, d), |(i, j)| rows[i][j]);
        let mean = data.mean_axis(Axis(0)).ok_or(ClusterError::EmptyDataset)?;
        let centered = &data - &mean;
        // sample covariance
        let covariance = centered.t().dot(&centered) / (n - 1) as f64;
        let total_variance = covariance.diag().sum();

        let (explained_variance, components): (Vec<f64>, Vec<Vec<f64>>) =
            eigh_descending(&covariance)?
                .into_iter()
                .take(k)
                .map(|(variance, mut axis)| {
                    // largest-magnitude entry positive
                    let pivot = axis
                        .iter()
                        .copied()
                        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
                    if pivot < 0.0 {
                        axis.iter_mut().for_each(|x| *x = -*x);
                    }
                    (variance.max(0.0), axis)
                })
                .unzip();

        debug!("Explained variance: {:?}", explained_variance);

        Ok(Self {
            mean: mean.to_vec(),
            components,
            explained_variance,
            total_variance,
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Fraction of total variance captured by each component
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        if self.total_variance <= 0.0 {
            return vec![0.0; self.explained_variance.len()];
        }
        self.explained_variance
            .iter()
            .map(|v| v / self.total_variance)
            .collect()
    }

    /// Project one standardized vector
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        let centered: Vec<f64> = features.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        Ok(self.components.iter().map(|c| dot(c, &centered)).collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
