//! Density-based clustering (DBSCAN) over dense points

use crate::model::{euclidean_distance, ClusterId, NOISE};
use crate::{ClusterError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// DBSCAN parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    /// Neighborhood radius, inclusive
    pub eps: f64,
    /// Minimum neighborhood size, the point itself included
    pub min_pts: usize,
}

/// Output of one clustering pass
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster id per input point, `NOISE` for unclustered points
    pub labels: Vec<ClusterId>,
    /// Whether each point was a core point
    pub core: Vec<bool>,
    /// Number of clusters found
    pub n_clusters: usize,
}

impl Clustering {
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Member count per cluster id
    pub fn cluster_sizes(&self) -> BTreeMap<ClusterId, usize> {
        let mut sizes = BTreeMap::new();
        for &label in self.labels.iter().filter(|&&l| l != NOISE) {
            *sizes.entry(label).or_insert(0) += 1;
        }
        sizes
    }
}

impl Dbscan {
    pub fn new(eps: f64, min_pts: usize) -> Self {
        Self { eps, min_pts }
    }

    /// Indices of all points within `eps` of `points[idx]`, itself included
    fn region_query(&self, points: &[&[f64]], idx: usize) -> Vec<usize> {
        let point = points[idx];
        points
            .iter()
            .enumerate()
            .filter(|(_, other)| euclidean_distance(point, other) <= self.eps)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cluster `points`.
    ///
    /// Points are visited in index order. Every unlabeled core point opens
    /// the next cluster id and the cluster grows through the neighborhoods
    /// of its core members; a border point keeps the first cluster that
    /// reaches it. The result is fully determined by the input order.
    pub fn fit<P: AsRef<[f64]>>(&self, points: &[P]) -> Result<Clustering> {
        let points: Vec<&[f64]> = points.iter().map(|p| p.as_ref()).collect();
        if let Some(first) = points.first() {
            if let Some(bad) = points.iter().find(|p| p.len() != first.len()) {
                return Err(ClusterError::DimensionMismatch {
                    expected: first.len(),
                    actual: bad.len(),
                });
            }
        }

        let n = points.len();
        let neighborhoods: Vec<Vec<usize>> = (0..n).map(|i| self.region_query(&points, i)).collect();
        let core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() >= self.min_pts)
            .collect();

        let mut labels = vec![NOISE; n];
        let mut next_id: ClusterId = 0;
        let mut stack = Vec::new();

        for start in 0..n {
            if labels[start] != NOISE || !core[start] {
                continue;
            }

            labels[start] = next_id;
            stack.push(start);
            while let Some(idx) = stack.pop() {
                if !core[idx] {
                    continue;
                }
                for &neighbor in &neighborhoods[idx] {
                    if labels[neighbor] == NOISE {
                        labels[neighbor] = next_id;
                        stack.push(neighbor);
                    }
                }
            }

            next_id += 1;
        }

        let clustering = Clustering {
            labels,
            core,
            n_clusters: next_id as usize,
        };
        debug!(
            "DBSCAN(eps={}, min_pts={}): {} points, {} clusters, {} noise",
            self.eps,
            self.min_pts,
            n,
            clustering.n_clusters,
            clustering.noise_count()
        );
        Ok(clustering)
    }
}
