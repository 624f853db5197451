//! Strategies for placing one new projected point into the cluster structure

use crate::model::dbscan::Dbscan;
use crate::model::ClusterId;
use crate::training::ReferenceCorpus;
use crate::{ClusterError, Result};
use tracing::debug;

/// Decides the cluster of a single new point given the reference corpus
pub trait ClusterAssigner: Send + Sync {
    fn assign(&self, corpus: &ReferenceCorpus, point: &[f64]) -> Result<ClusterId>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Re-runs DBSCAN over the whole corpus with the new point appended last
/// and reports the id the new point receives in that run.
///
/// Ids from this run are numbered independently of the corpus-only run,
/// so they are not guaranteed to match the ids in a `ClusterLabelMap`.
#[derive(Debug, Clone, Copy)]
pub struct ReclusterAssigner {
    dbscan: Dbscan,
}

impl ReclusterAssigner {
    pub fn new(eps: f64, min_pts: usize) -> Self {
        Self {
            dbscan: Dbscan::new(eps, min_pts),
        }
    }

    pub fn dbscan(&self) -> &Dbscan {
        &self.dbscan
    }
}

impl ClusterAssigner for ReclusterAssigner {
    fn assign(&self, corpus: &ReferenceCorpus, point: &[f64]) -> Result<ClusterId> {
        if point.len() != corpus.dimension() {
            return Err(ClusterError::DimensionMismatch {
                expected: corpus.dimension(),
                actual: point.len(),
            });
        }

        if let Some(idx) = point.iter().position(|v| !v.is_finite()) {
            return Err(ClusterError::NonFiniteFeature(format!("component {}", idx + 1)));
        }

        let mut combined: Vec<&[f64]> = corpus.points().iter().map(Vec::as_slice).collect();
        combined.push(point);

        let clustering = self.dbscan.fit(&combined)?;
        let assigned = clustering.labels[combined.len() - 1];

        debug!(
            "Re-clustered {} points: {} clusters, new point -> {}",
            combined.len(),
            clustering.n_clusters,
            assigned
        );
        Ok(assigned)
    }

    fn name(&self) -> &'static str {
        "dbscan-recluster"
    }
}
