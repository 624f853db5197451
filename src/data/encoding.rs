//! One-hot encoding of patient records against a frozen column vocabulary

use crate::data::{PatientRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Encoded column name for a categorical indicator, e.g. `gender_Male`
pub fn indicator_column(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

/// A row of named encoded values, not yet aligned to any vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl EncodedRow {
    /// Encode a record on its own: numeric columns plus one indicator per categorical value
    pub fn from_record(record: &PatientRecord) -> Self {
        let mut columns: Vec<String> = NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect();
        let mut values: Vec<f64> = record.numeric_values().to_vec();

        for (field, value) in CATEGORICAL_FIELDS.iter().zip(record.categorical_values()) {
            columns.push(indicator_column(field, value));
            values.push(1.0);
        }

        Self { columns, values }
    }

    #[cfg(test)]
    fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }
}

/// Ordered encoded column names fixed at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVocabulary {
    columns: Vec<String>,
}

impl FeatureVocabulary {
    /// Build the vocabulary from training records.
    ///
    /// Numeric columns come first in `NUMERIC_FIELDS` order. Each categorical
    /// field then contributes one indicator per distinct value in sorted
    /// order, with the first value dropped as the reference category.
    pub fn fit(records: &[PatientRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }

        let mut columns: Vec<String> = NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect();

        for field in CATEGORICAL_FIELDS {
            let levels: BTreeSet<&str> = records.iter().filter_map(|r| r.categorical(field)).collect();

            let mut levels = levels.into_iter();
            if let Some(reference) = levels.next() {
                debug!("{}: reference category {:?}", field, reference);
            }
            columns.extend(levels.map(|level| indicator_column(field, level)));
        }

        debug!("Feature vocabulary: {} columns", columns.len());
        Ok(Self { columns })
    }

    /// Build directly from column names
    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Copy of this vocabulary without the named columns
    pub fn without(&self, excluded: &[String]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !excluded.contains(c))
                .cloned()
                .collect(),
        }
    }

    /// Align a row to this vocabulary: missing columns become 0, extra
    /// columns are dropped, vocabulary order is kept.
    pub fn realign(&self, row: &EncodedRow) -> EncodedRow {
        let lookup: HashMap<&str, f64> = row
            .columns
            .iter()
            .map(String::as_str)
            .zip(row.values.iter().copied())
            .collect();

        let values = self
            .columns
            .iter()
            .map(|c| lookup.get(c.as_str()).copied().unwrap_or(0.0))
            .collect();

        EncodedRow {
            columns: self.columns.clone(),
            values,
        }
    }

    /// Encode a record into a vector of exactly `self.len()` values.
    ///
    /// A categorical value equal to the reference category, or never seen
    /// at fit time, leaves all of that field's indicators at zero.
    pub fn encode(&self, record: &PatientRecord) -> Vec<f64> {
        self.realign(&EncodedRow::from_record(record)).values
    }

    pub fn encode_all(&self, records: &[PatientRecord]) -> Vec<Vec<f64>> {
        records.iter().map(|r| self.encode(r)).collect()
    }
}
