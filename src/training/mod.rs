pub mod reference;

pub use reference::ReferenceModel;

use crate::model::ClusterId;
use crate::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Projected training points with their outcomes, in dataset order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCorpus {
    points: Vec<Vec<f64>>,
    outcomes: Vec<u8>,
}

impl ReferenceCorpus {
    pub fn new(points: Vec<Vec<f64>>, outcomes: Vec<u8>) -> Result<Self> {
        if points.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }
        if points.len() != outcomes.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: points.len(),
                actual: outcomes.len(),
            });
        }
        let dim = points[0].len();
        if let Some(p) = points.iter().find(|p| p.len() != dim) {
            return Err(ClusterError::DimensionMismatch {
                expected: dim,
                actual: p.len(),
            });
        }
        Ok(Self { points, outcomes })
    }

    /// Build from (point, outcome) pairs
    pub fn from_entries(entries: Vec<(Vec<f64>, u8)>) -> Result<Self> {
        let (points, outcomes) = entries.into_iter().unzip();
        Self::new(points, outcomes)
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn outcomes(&self) -> &[u8] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension of every point
    pub fn dimension(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }
}

/// Description of a fitted reference model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSummary {
    pub records: usize,
    pub positive_outcomes: usize,
    pub features: Vec<String>,
    pub pruned_features: Vec<String>,
    pub explained_variance_ratio: Vec<f64>,
    pub eps: f64,
    pub min_pts: usize,
    pub clusters: usize,
    pub noise_points: usize,
    pub cluster_sizes: BTreeMap<ClusterId, usize>,
    pub cluster_labels: BTreeMap<ClusterId, u8>,
}

impl ReferenceSummary {
    /// Print summary to stdout
    pub fn print(&self) {
        println!("\n=== Reference Model ===");
        println!("Records: {} ({} with heart_disease=1)", self.records, self.positive_outcomes);
        println!("Encoded features: {}", self.features.len());
        if !self.pruned_features.is_empty() {
            println!("Pruned zero-variance features: {}", self.pruned_features.join(", "));
        }
        let captured: f64 = self.explained_variance_ratio.iter().sum();
        println!(
            "Components: {} ({:.2}% of variance)",
            self.explained_variance_ratio.len(),
            captured * 100.0
        );
        println!("DBSCAN: eps={}, min_pts={}", self.eps, self.min_pts);
        println!("Clusters: {}  Noise points: {}", self.clusters, self.noise_points);
        for (cluster, size) in &self.cluster_sizes {
            let label = self
                .cluster_labels
                .get(cluster)
                .map_or("-".to_string(), |l| l.to_string());
            println!("  cluster {:>3}: {:>6} points, majority heart_disease={}", cluster, size, label);
        }
        println!("=======================\n");
    }
}
