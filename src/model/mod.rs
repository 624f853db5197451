pub mod assigner;
pub mod dbscan;
pub mod labels;
pub mod projection;

use crate::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Cluster identifier as produced by DBSCAN; `NOISE` marks unclustered points
pub type ClusterId = i32;

/// Identifier of points not reachable from any core point
pub const NOISE: ClusterId = -1;

/// Model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of projected components
    pub n_components: usize,

    /// DBSCAN neighborhood radius in projected space
    pub eps: f64,

    /// Minimum neighbors (self included) for a core point
    pub min_pts: usize,

    /// Drop zero-variance columns before fitting the scaler
    pub prune_degenerate_features: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_components: 7,
            eps: 3.0,
            min_pts: 5,
            prune_degenerate_features: true,
        }
    }
}

impl ModelConfig {
    pub fn with_n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    pub fn with_prune_degenerate_features(mut self, prune: bool) -> Self {
        self.prune_degenerate_features = prune;
        self
    }

    /// Load configuration from a JSON file; missing keys take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading model configuration from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(ClusterError::InvalidConfig(
                "n_components must be positive".to_string(),
            ));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "eps must be a positive number, got {}",
                self.eps
            )));
        }
        if self.min_pts == 0 {
            return Err(ClusterError::InvalidConfig(
                "min_pts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Euclidean distance between two points of equal dimension
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();

        assert_eq!(config.n_components, 7);
        assert_eq!(config.eps, 3.0);
        assert_eq!(config.min_pts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_validation() {
        let config = ModelConfig::default().with_eps(2.0).with_min_pts(4);
        assert_eq!(config.eps, 2.0);
        assert_eq!(config.min_pts, 4);

        assert!(ModelConfig::default().with_eps(0.0).validate().is_err());
        assert!(ModelConfig::default().with_min_pts(0).validate().is_err());
        assert!(ModelConfig::default().with_n_components(0).validate().is_err());
    }

    #[test]
    fn test_load_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{ "eps": 2.0 }"#).unwrap();

        let config = ModelConfig::load(&path).unwrap();
        assert_eq!(config.eps, 2.0);
        assert_eq!(config.min_pts, 5);
        assert_eq!(config.n_components, 7);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let config = ModelConfig::default().with_eps(2.5).with_prune_degenerate_features(false);
        config.save(&path).unwrap();

        assert_eq!(ModelConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[1.0], &[1.0]), 0.0);
    }
}
