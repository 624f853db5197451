use crate::data::encoding::FeatureVocabulary;
use crate::data::preprocessing::{FeatureStats, ScalerState};
use crate::data::{outcome_distribution, LabeledRecord, PatientRecord};
use crate::model::dbscan::{Clustering, Dbscan};
use crate::model::labels::ClusterLabelMap;
use crate::model::projection::ProjectionState;
use crate::model::ModelConfig;
use crate::training::{ReferenceCorpus, ReferenceSummary};
use crate::{ClusterError, Result};
use std::time::Instant;
use tracing::{debug, info, warn};

/// First column holding NaN or an infinity, by name
fn ensure_finite(columns: &[String], values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(ClusterError::NonFiniteFeature(
            columns.get(idx).cloned().unwrap_or_else(|| format!("#{}", idx)),
        )),
        None => Ok(()),
    }
}

/// Every artifact fitted from the historical dataset.
///
/// Built once at startup and only read afterwards; classification borrows
/// it and never mutates it.
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    config: ModelConfig,
    vocabulary: FeatureVocabulary,
    pruned_features: Vec<String>,
    scaler: ScalerState,
    projection: ProjectionState,
    corpus: ReferenceCorpus,
    clustering: Clustering,
    label_map: ClusterLabelMap,
}

impl ReferenceModel {
    /// Fit vocabulary, scaler and projection on `records`, then cluster the
    /// projected corpus once to build the label map.
    pub fn fit(records: &[LabeledRecord], config: ModelConfig) -> Result<Self> {
        config.validate()?;
        if records.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }

        let start_time = Instant::now();
        let (pos, neg) = outcome_distribution(records);
        info!(
            "Fitting reference model on {} records (heart_disease=1: {}, =0: {})",
            records.len(),
            pos,
            neg
        );

        let patients: Vec<PatientRecord> = records.iter().map(|r| r.record.clone()).collect();
        let outcomes: Vec<u8> = records.iter().map(|r| r.outcome).collect();

        let mut vocabulary = FeatureVocabulary::fit(&patients)?;
        let mut encoded = vocabulary.encode_all(&patients);
        for row in &encoded {
            ensure_finite(vocabulary.columns(), row)?;
        }

        let degenerate: Vec<String> = FeatureStats::compute(&encoded)?
            .degenerate_columns()
            .into_iter()
            .map(|idx| vocabulary.columns()[idx].clone())
            .collect();

        let mut pruned_features = Vec::new();
        if !degenerate.is_empty() {
            if !config.prune_degenerate_features {
                return Err(ClusterError::DegenerateFeature(degenerate[0].clone()));
            }
            for column in &degenerate {
                warn!("Dropping zero-variance feature `{}`", column);
            }
            vocabulary = vocabulary.without(&degenerate);
            encoded = vocabulary.encode_all(&patients);
            pruned_features = degenerate;
        }
        debug!("Vocabulary: {:?}", vocabulary.columns());

        let scaler = ScalerState::fit(&encoded, vocabulary.columns())?;
        let scaled = scaler.transform_all(&encoded)?;

        let projection = ProjectionState::fit(&scaled, config.n_components)?;
        let projected = projection.transform_all(&scaled)?;

        let corpus = ReferenceCorpus::new(projected, outcomes)?;
        let mut model = Self::from_parts(config, vocabulary, scaler, projection, corpus)?;
        model.pruned_features = pruned_features;

        info!(
            "Reference model ready in {:.2}s: {} clusters, {} noise points",
            start_time.elapsed().as_secs_f64(),
            model.clustering.n_clusters,
            model.clustering.noise_count()
        );
        Ok(model)
    }

    /// Assemble a model from already-fitted parts and run the corpus-only
    /// clustering that produces the label map.
    pub fn from_parts(
        config: ModelConfig,
        vocabulary: FeatureVocabulary,
        scaler: ScalerState,
        projection: ProjectionState,
        corpus: ReferenceCorpus,
    ) -> Result<Self> {
        config.validate()?;
        if scaler.n_features() != vocabulary.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: vocabulary.len(),
                actual: scaler.n_features(),
            });
        }
        if projection.n_features() != vocabulary.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: vocabulary.len(),
                actual: projection.n_features(),
            });
        }
        if corpus.dimension() != projection.n_components() {
            return Err(ClusterError::DimensionMismatch {
                expected: projection.n_components(),
                actual: corpus.dimension(),
            });
        }

        let clustering = Dbscan::new(config.eps, config.min_pts).fit(corpus.points())?;
        let label_map = ClusterLabelMap::from_assignments(&clustering.labels, corpus.outcomes());

        Ok(Self {
            config,
            vocabulary,
            pruned_features: Vec::new(),
            scaler,
            projection,
            corpus,
            clustering,
            label_map,
        })
    }

    /// Encode, standardize and project one record
    pub fn project(&self, record: &PatientRecord) -> Result<Vec<f64>> {
        let encoded = self.vocabulary.encode(record);
        ensure_finite(self.vocabulary.columns(), &encoded)?;
        let scaled = self.scaler.transform(&encoded)?;
        self.projection.transform(&scaled)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    pub fn projection(&self) -> &ProjectionState {
        &self.projection
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    /// The corpus-only clustering behind the label map
    pub fn clustering(&self) -> &Clustering {
        &self.clustering
    }

    pub fn label_map(&self) -> &ClusterLabelMap {
        &self.label_map
    }

    pub fn summary(&self) -> ReferenceSummary {
        ReferenceSummary {
            records: self.corpus.len(),
            positive_outcomes: self.corpus.outcomes().iter().filter(|&&o| o == 1).count(),
            features: self.vocabulary.columns().to_vec(),
            pruned_features: self.pruned_features.clone(),
            explained_variance_ratio: self.projection.explained_variance_ratio(),
            eps: self.config.eps,
            min_pts: self.config.min_pts,
            clusters: self.clustering.n_clusters,
            noise_points: self.clustering.noise_count(),
            cluster_sizes: self.clustering.cluster_sizes(),
            cluster_labels: self.label_map.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn small_config() -> ModelConfig {
        // the fixture is small, so use a wide radius
        ModelConfig::default().with_eps(4.0).with_min_pts(3)
    }

    #[test]
    fn test_fit_builds_consistent_artifacts() {
        let records = fixtures::labeled_records();
        let model = ReferenceModel::fit(&records, small_config()).unwrap();

        assert_eq!(model.corpus().len(), records.len());
        assert_eq!(model.corpus().dimension(), 7);
        assert_eq!(model.scaler().n_features(), model.vocabulary().len());
        assert_eq!(model.clustering().labels.len(), records.len());
        assert!(model.label_map().len() <= model.clustering().n_clusters);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let records = fixtures::labeled_records();
        let first = ReferenceModel::fit(&records, small_config()).unwrap();
        let second = ReferenceModel::fit(&records, small_config()).unwrap();

        assert_eq!(first.corpus(), second.corpus());
        assert_eq!(first.label_map(), second.label_map());
    }

    #[test]
    fn test_project_matches_corpus_point() {
        let records = fixtures::labeled_records();
        let model = ReferenceModel::fit(&records, small_config()).unwrap();

        let projected = model.project(&records[3].record).unwrap();
        for (a, b) in projected.iter().zip(&model.corpus().points()[3]) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_feature_pruned_or_rejected() {
        let mut records = fixtures::labeled_records();
        for r in records.iter_mut() {
            r.record.insulin = 100.0;
        }

        let model = ReferenceModel::fit(&records, small_config()).unwrap();
        assert_eq!(model.summary().pruned_features, vec!["insulin".to_string()]);
        assert!(!model.vocabulary().columns().iter().any(|c| c == "insulin"));

        let strict = small_config().with_prune_degenerate_features(false);
        match ReferenceModel::fit(&records, strict) {
            Err(ClusterError::DegenerateFeature(name)) => assert_eq!(name, "insulin"),
            other => panic!("Expected DegenerateFeature, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let records = fixtures::labeled_records();
        let model = ReferenceModel::fit(&records, small_config()).unwrap();

        let mut record = records[0].record.clone();
        record.bmi = f64::NAN;
        match model.project(&record) {
            Err(ClusterError::NonFiniteFeature(name)) => assert_eq!(name, "bmi"),
            other => panic!("Expected NonFiniteFeature, got {:?}", other),
        }

        record.bmi = 25.0;
        record.cholesterol = f64::INFINITY;
        assert!(matches!(
            model.project(&record),
            Err(ClusterError::NonFiniteFeature(_))
        ));

        let mut training = records.clone();
        training[5].record.age = f64::NAN;
        assert!(matches!(
            ReferenceModel::fit(&training, small_config()),
            Err(ClusterError::NonFiniteFeature(_))
        ));
    }

    #[test]
    fn test_empty_dataset() {
        assert!(matches!(
            ReferenceModel::fit(&[], ModelConfig::default()),
            Err(ClusterError::EmptyDataset)
        ));
    }

    #[test]
    fn test_summary_counts() {
        let records = fixtures::labeled_records();
        let model = ReferenceModel::fit(&records, small_config()).unwrap();
        let summary = model.summary();

        assert_eq!(summary.records, records.len());
        assert_eq!(summary.positive_outcomes, 12);
        let clustered: usize = summary.cluster_sizes.values().sum();
        assert_eq!(clustered + summary.noise_points, records.len());
    }
}
