pub mod encoding;
pub mod loader;
pub mod preprocessing;

use serde::{Deserialize, Serialize};

/// Numeric columns, in encoded-vector order
pub const NUMERIC_FIELDS: [&str; 12] = [
    "age",
    "chest_pain_type",
    "blood_pressure",
    "cholesterol",
    "max_heart_rate",
    "exercise_angina",
    "plasma_glucose",
    "skin_thickness",
    "insulin",
    "bmi",
    "diabetes_pedigree",
    "hypertension",
];

/// Categorical columns, one-hot encoded after the numeric block in this order
pub const CATEGORICAL_FIELDS: [&str; 3] = ["gender", "residence_type", "smoking_status"];

/// Ground-truth outcome column of the historical dataset
pub const OUTCOME_FIELD: &str = "heart_disease";

/// Canonical gender values
pub const GENDERS: &[&str] = &["Male", "Female"];

/// Canonical residence types
pub const RESIDENCE_TYPES: &[&str] = &["Urban", "Rural"];

/// Canonical smoking statuses
pub const SMOKING_STATUSES: &[&str] = &["never smoked", "unknown", "smokes"];

/// One patient as supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,
    /// Chest pain type code
    pub chest_pain_type: f64,
    /// Resting blood pressure
    pub blood_pressure: f64,
    /// Serum cholesterol
    pub cholesterol: f64,
    /// Maximum heart rate achieved
    pub max_heart_rate: f64,
    /// Exercise-induced angina (0/1)
    pub exercise_angina: f64,
    /// Plasma glucose
    pub plasma_glucose: f64,
    /// Skin thickness
    pub skin_thickness: f64,
    /// Insulin
    pub insulin: f64,
    /// Body mass index
    pub bmi: f64,
    /// Diabetes pedigree function
    pub diabetes_pedigree: f64,
    /// Hypertension (0/1)
    pub hypertension: f64,

    /// Gender (e.g. "Male", "Female")
    pub gender: String,
    /// Residence type (e.g. "Urban", "Rural")
    pub residence_type: String,
    /// Smoking status (e.g. "never smoked", "unknown", "smokes")
    pub smoking_status: String,
}

impl PatientRecord {
    /// Numeric values in `NUMERIC_FIELDS` order
    pub fn numeric_values(&self) -> [f64; 12] {
        [
            self.age,
            self.chest_pain_type,
            self.blood_pressure,
            self.cholesterol,
            self.max_heart_rate,
            self.exercise_angina,
            self.plasma_glucose,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.hypertension,
        ]
    }

    /// Categorical values in `CATEGORICAL_FIELDS` order
    pub fn categorical_values(&self) -> [&str; 3] {
        [&self.gender, &self.residence_type, &self.smoking_status]
    }

    /// Look up a categorical value by column name
    pub fn categorical(&self, field: &str) -> Option<&str> {
        CATEGORICAL_FIELDS
            .iter()
            .position(|&f| f == field)
            .map(|idx| self.categorical_values()[idx])
    }
}

/// Historical record with its ground-truth outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: PatientRecord,
    /// 1 or 0 as recorded in the `heart_disease` column
    pub outcome: u8,
}

impl LabeledRecord {
    pub fn new(record: PatientRecord, outcome: u8) -> Self {
        Self { record, outcome }
    }
}

/// Count outcomes as (positive, negative)
pub fn outcome_distribution(records: &[LabeledRecord]) -> (usize, usize) {
    let pos = records.iter().filter(|r| r.outcome == 1).count();
    (pos, records.len() - pos)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn patient(age: f64, gender: &str, residence: &str, smoking: &str) -> PatientRecord {
        PatientRecord {
            age,
            chest_pain_type: 1.0,
            blood_pressure: 120.0 + age / 2.0,
            cholesterol: 180.0 + age,
            max_heart_rate: 200.0 - age,
            exercise_angina: if age > 55.0 { 1.0 } else { 0.0 },
            plasma_glucose: 90.0 + age / 3.0,
            skin_thickness: 20.0,
            insulin: 80.0 + age / 4.0,
            bmi: 24.0 + age / 20.0,
            diabetes_pedigree: 0.3 + age / 200.0,
            hypertension: if age > 60.0 { 1.0 } else { 0.0 },
            gender: gender.to_string(),
            residence_type: residence.to_string(),
            smoking_status: smoking.to_string(),
        }
    }

    /// Small labeled dataset with every canonical category present
    pub fn labeled_records() -> Vec<LabeledRecord> {
        let mut records = Vec::new();
        for i in 0..24 {
            let age = 30.0 + i as f64 * 2.0;
            let gender = GENDERS[i % 2];
            let residence = RESIDENCE_TYPES[(i / 2) % 2];
            let smoking = SMOKING_STATUSES[i % 3];
            let mut record = patient(age, gender, residence, smoking);
            record.skin_thickness = 15.0 + (i % 5) as f64;
            record.chest_pain_type = (i % 4) as f64;
            records.push(LabeledRecord::new(record, (age < 54.0) as u8));
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_follow_field_order() {
        let record = fixtures::patient(50.0, "Male", "Urban", "smokes");
        let values = record.numeric_values();

        assert_eq!(values.len(), NUMERIC_FIELDS.len());
        assert_eq!(values[0], 50.0);
        assert_eq!(values[4], 150.0); // max_heart_rate
    }

    #[test]
    fn test_categorical_lookup() {
        let record = fixtures::patient(50.0, "Female", "Rural", "never smoked");

        assert_eq!(record.categorical("gender"), Some("Female"));
        assert_eq!(record.categorical("smoking_status"), Some("never smoked"));
        assert_eq!(record.categorical("bmi"), None);
    }

    #[test]
    fn test_outcome_distribution() {
        let records = fixtures::labeled_records();
        let (pos, neg) = outcome_distribution(&records);

        assert_eq!(pos + neg, records.len());
        assert_eq!(pos, 12);
    }
}
