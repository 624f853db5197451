pub mod classifier;

use crate::model::labels::ClusterLabelMap;
use crate::model::{ClusterId, NOISE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of classifying one patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Not reachable from any core point
    Noise,
    /// Assigned to a cluster with a known majority outcome
    Known { cluster: ClusterId, outcome: u8 },
    /// Assigned to a cluster id absent from the label map
    Unknown { cluster: ClusterId },
}

impl Verdict {
    /// Combine an assigned cluster id with the corpus-only label map
    pub fn resolve(cluster: ClusterId, labels: &ClusterLabelMap) -> Self {
        if cluster == NOISE {
            return Verdict::Noise;
        }
        match labels.resolve(cluster) {
            Some(outcome) => Verdict::Known { cluster, outcome },
            None => Verdict::Unknown { cluster },
        }
    }

    /// Assigned cluster id, `NOISE` for noise
    pub fn cluster(&self) -> ClusterId {
        match self {
            Verdict::Noise => NOISE,
            Verdict::Known { cluster, .. } | Verdict::Unknown { cluster } => *cluster,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Noise => "noise",
            Verdict::Known { .. } => "known",
            Verdict::Unknown { .. } => "unknown",
        }
    }

    /// Majority `heart_disease` value of the assigned cluster, if known
    pub fn outcome(&self) -> Option<u8> {
        match self {
            Verdict::Known { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// Whether the verdict points to heart disease.
    ///
    /// A cluster whose majority outcome is 0 reads as heart disease and one
    /// whose majority is 1 reads as no heart disease.
    pub fn likely_heart_disease(&self) -> Option<bool> {
        self.outcome().map(|o| o == 0)
    }

    /// Display text for callers
    pub fn message(&self) -> String {
        match self {
            Verdict::Noise => {
                "This patient is considered NOISE (does not belong to any cluster).".to_string()
            }
            Verdict::Known { cluster, outcome: 1 } => {
                format!("Patient belongs to Cluster {} → Likely No Heart Disease", cluster)
            }
            Verdict::Known { cluster, .. } => {
                format!("Patient belongs to Cluster {} → Likely HEART DISEASE", cluster)
            }
            Verdict::Unknown { cluster } => format!(
                "Patient belongs to Cluster {}, but heart disease status is UNKNOWN.",
                cluster
            ),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Verdict plus the intermediate values that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: Verdict,
    /// The record after encoding, scaling and projection
    pub projected: Vec<f64>,
}

impl Classification {
    pub fn cluster(&self) -> ClusterId {
        self.verdict.cluster()
    }
}

/// One classified row of a batch file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Data line number in the input file
    pub line: usize,
    pub classification: Classification,
    /// Ground-truth outcome when the input carried one
    pub outcome: Option<u8>,
}

/// Batch classification results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchClassificationResult {
    pub entries: Vec<BatchEntry>,
    pub summary: ClassificationSummary,
}

impl BatchClassificationResult {
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        let summary = ClassificationSummary::from_entries(&entries);
        Self { entries, summary }
    }
}

/// Counts per verdict kind, plus agreement with ground truth where present
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClassificationSummary {
    pub total: usize,
    pub noise: usize,
    pub known: usize,
    pub unknown: usize,
    pub likely_heart_disease: usize,
    pub likely_no_heart_disease: usize,
    /// Known verdicts whose row carried an outcome
    pub evaluated: usize,
    /// Of `evaluated`, those whose cluster majority equals the row outcome
    pub agreeing: usize,
}

impl ClassificationSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            let verdict = &entry.classification.verdict;
            match verdict {
                Verdict::Noise => summary.noise += 1,
                Verdict::Known { .. } => summary.known += 1,
                Verdict::Unknown { .. } => summary.unknown += 1,
            }
            match verdict.likely_heart_disease() {
                Some(true) => summary.likely_heart_disease += 1,
                Some(false) => summary.likely_no_heart_disease += 1,
                None => {}
            }
            if let (Some(predicted), Some(actual)) = (verdict.outcome(), entry.outcome) {
                summary.evaluated += 1;
                if predicted == actual {
                    summary.agreeing += 1;
                }
            }
        }

        summary
    }

    /// Share of evaluated known verdicts that match the recorded outcome
    pub fn agreement_rate(&self) -> Option<f64> {
        if self.evaluated == 0 {
            None
        } else {
            Some(self.agreeing as f64 / self.evaluated as f64)
        }
    }

    /// Print summary to stdout
    pub fn print(&self) {
        let pct = |n: usize| {
            if self.total > 0 {
                n as f64 / self.total as f64 * 100.0
            } else {
                0.0
            }
        };

        println!("\n=== Classification Summary ===");
        println!("Total records: {}", self.total);
        println!("Noise: {} ({:.2}%)", self.noise, pct(self.noise));
        println!("Known cluster: {} ({:.2}%)", self.known, pct(self.known));
        println!("  likely heart disease: {}", self.likely_heart_disease);
        println!("  likely no heart disease: {}", self.likely_no_heart_disease);
        println!("Unknown cluster label: {} ({:.2}%)", self.unknown, pct(self.unknown));
        if let Some(rate) = self.agreement_rate() {
            println!(
                "Agreement with recorded outcome: {}/{} ({:.2}%)",
                self.agreeing,
                self.evaluated,
                rate * 100.0
            );
        }
        println!("==============================\n");
    }
}
