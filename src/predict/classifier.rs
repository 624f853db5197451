use crate::data::loader::PatientRow;
use crate::data::PatientRecord;
use crate::model::assigner::{ClusterAssigner, ReclusterAssigner};
use crate::predict::{BatchClassificationResult, BatchEntry, Classification, Verdict};
use crate::training::ReferenceModel;
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Classifies patients against a fitted reference model
pub struct Classifier<'a> {
    model: &'a ReferenceModel,
    assigner: Box<dyn ClusterAssigner + 'a>,
    show_progress: bool,
}

impl<'a> Classifier<'a> {
    /// Classifier that re-clusters the corpus with the model's eps/min_pts
    pub fn new(model: &'a ReferenceModel) -> Self {
        let config = model.config();
        Self {
            model,
            assigner: Box::new(ReclusterAssigner::new(config.eps, config.min_pts)),
            show_progress: false,
        }
    }

    /// Swap in a different assignment strategy
    pub fn with_assigner(mut self, assigner: Box<dyn ClusterAssigner + 'a>) -> Self {
        self.assigner = assigner;
        self
    }

    /// Show a progress bar during batch classification
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn model(&self) -> &ReferenceModel {
        self.model
    }

    /// Encode, scale, project, assign and resolve one record
    pub fn classify(&self, record: &PatientRecord) -> Result<Classification> {
        let projected = self.model.project(record)?;
        self.classify_point(projected)
    }

    /// Assign and resolve an already projected point
    pub fn classify_point(&self, projected: Vec<f64>) -> Result<Classification> {
        let cluster = self.assigner.assign(self.model.corpus(), &projected)?;
        let verdict = Verdict::resolve(cluster, self.model.label_map());
        debug!("{} assigned cluster {} -> {}", self.assigner.name(), cluster, verdict.kind());

        Ok(Classification { verdict, projected })
    }

    /// Classify every row; the first failing row aborts the batch
    pub fn classify_batch(&self, rows: &[PatientRow]) -> Result<BatchClassificationResult> {
        info!("Classifying {} records", rows.len());

        let progress = if self.show_progress {
            let pb = ProgressBar::new(rows.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let classification = self.classify(&row.record)?;
            entries.push(BatchEntry {
                line: row.line,
                classification,
                outcome: row.outcome,
            });
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(BatchClassificationResult::new(entries))
    }
}

/// Writing batch results to disk
pub mod utils {
    use crate::predict::BatchClassificationResult;
    use crate::Result;
    use std::path::Path;

    /// One CSV row per entry: line, kind, cluster, outcome, verdict text
    pub fn save_classifications_to_csv<P: AsRef<Path>>(
        result: &BatchClassificationResult,
        path: P,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["line", "kind", "cluster", "cluster_outcome", "recorded_outcome", "verdict"])?;

        for entry in &result.entries {
            let verdict = &entry.classification.verdict;
            writer.write_record([
                entry.line.to_string(),
                verdict.kind().to_string(),
                verdict.cluster().to_string(),
                verdict.outcome().map(|o| o.to_string()).unwrap_or_default(),
                entry.outcome.map(|o| o.to_string()).unwrap_or_default(),
                verdict.message(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn save_classifications_to_json<P: AsRef<Path>>(
        result: &BatchClassificationResult,
        path: P,
    ) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
