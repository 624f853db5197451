//! # hdcluster: density-cluster heart-disease classifier
//!
//! hdcluster assigns a newly observed patient record to a DBSCAN cluster
//! derived from a fixed historical dataset and reports the heart-disease
//! likelihood implied by that cluster's majority outcome.
//!
//! ## Pipeline
//!
//! - One-hot encoding against a frozen column vocabulary
//! - Z-score standardization with frozen statistics
//! - PCA projection to 7 components
//! - DBSCAN over the reference corpus plus the new point
//! - Cluster id to majority outcome lookup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hdcluster::data::loader::DataLoader;
//! use hdcluster::model::ModelConfig;
//! use hdcluster::predict::classifier::Classifier;
//! use hdcluster::training::ReferenceModel;
//!
//! let records = DataLoader::new().load_labeled("patient_data_cleaned.csv").unwrap();
//! let model = ReferenceModel::fit(&records, ModelConfig::default()).unwrap();
//!
//! let classifier = Classifier::new(&model);
//! let classification = classifier.classify(&records[0].record).unwrap();
//! println!("{}", classification.verdict);
//! ```

pub mod cli;
pub mod data;
pub mod model;
pub mod predict;
pub mod training;
pub mod utils;

pub use data::{LabeledRecord, PatientRecord};
pub use model::ModelConfig;
pub use predict::{Classification, Verdict};
pub use training::{ReferenceCorpus, ReferenceModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Result type for hdcluster operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Main error type for hdcluster
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Schema mismatch: missing required column `{0}`")]
    SchemaMismatch(String),

    #[error("Degenerate feature `{0}`: zero variance in reference data")]
    DegenerateFeature(String),

    #[error("Reference dataset is empty")]
    EmptyDataset,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite value in feature `{0}`")]
    NonFiniteFeature(String),

    #[error("Projection failed: {0}")]
    Projection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - density-cluster heart-disease classifier",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("hdcluster"));
        assert!(info_str.contains(VERSION));
    }

    #[test]
    fn test_error_display() {
        let err = ClusterError::SchemaMismatch("bmi".to_string());
        assert_eq!(err.to_string(), "Schema mismatch: missing required column `bmi`");

        let err = ClusterError::DimensionMismatch { expected: 7, actual: 3 };
        assert!(err.to_string().contains("expected 7"));

        let err = ClusterError::NonFiniteFeature("bmi".to_string());
        assert_eq!(err.to_string(), "Non-finite value in feature `bmi`");
    }
}
