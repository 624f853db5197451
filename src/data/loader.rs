use crate::data::{
    LabeledRecord, PatientRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS, OUTCOME_FIELD,
};
use crate::{ClusterError, Result};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());

        match (ext, stem) {
            (Some("gz"), Some(stem)) => {
                if stem.ends_with(".csv") {
                    Ok(FileFormat::GzippedCsv)
                } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
                    Ok(FileFormat::GzippedTsv)
                } else {
                    Err(ClusterError::InvalidConfig(format!(
                        "Cannot determine format of gzipped file {:?}",
                        path
                    )))
                }
            }
            (Some("csv"), _) => Ok(FileFormat::Csv),
            (Some("tsv"), _) | (Some("txt"), _) => Ok(FileFormat::Tsv),
            _ => Err(ClusterError::InvalidConfig(format!(
                "Unsupported file format: {:?}",
                path
            ))),
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// Data loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Log progress every this many rows
    pub batch_size: usize,
    /// Maximum number of records to load (0 = unlimited)
    pub max_records: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 10000,
            max_records: 0,
        }
    }
}

/// A patient row from a batch file; the outcome column is optional there
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRow {
    /// 1-based data line number in the source file
    pub line: usize,
    pub record: PatientRecord,
    pub outcome: Option<u8>,
}

/// Column name to position lookup for one file
struct Header {
    index: HashMap<String, usize>,
}

impl Header {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn require(&self, columns: &[&str]) -> Result<()> {
        match columns.iter().find(|c| !self.index.contains_key(**c)) {
            Some(missing) => Err(ClusterError::SchemaMismatch(missing.to_string())),
            None => Ok(()),
        }
    }

    fn has(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    fn field<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.index
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
    }
}

/// Data loader for patient tables
pub struct DataLoader {
    config: LoaderConfig,
}

impl DataLoader {
    /// Create new data loader with default config
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create new data loader with custom config
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load the historical dataset; every feature column and the outcome
    /// column must be present.
    pub fn load_labeled<P: AsRef<Path>>(&self, path: P) -> Result<Vec<LabeledRecord>> {
        let (reader, format) = self.open(path.as_ref())?;
        self.parse_labeled(reader, format)
    }

    /// Load patients to classify; the outcome column is used when present.
    pub fn load_patients<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PatientRow>> {
        let (reader, format) = self.open(path.as_ref())?;
        self.parse_patients(reader, format)
    }

    fn open(&self, path: &Path) -> Result<(Box<dyn Read>, FileFormat)> {
        info!("Loading data from {:?}", path);

        let format = FileFormat::from_path(path)?;
        debug!("Detected file format: {:?}", format);

        let file = File::open(path)?;
        let reader: Box<dyn Read> = if format.is_gzipped() {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok((reader, format))
    }

    fn parse_labeled<R: Read>(&self, reader: R, format: FileFormat) -> Result<Vec<LabeledRecord>> {
        let rows = self.parse_rows(reader, format, true)?;
        let records: Vec<LabeledRecord> = rows
            .into_iter()
            .filter_map(|row| row.outcome.map(|outcome| LabeledRecord::new(row.record, outcome)))
            .collect();

        info!("Loaded {} labeled records", records.len());
        Ok(records)
    }

    fn parse_patients<R: Read>(&self, reader: R, format: FileFormat) -> Result<Vec<PatientRow>> {
        let rows = self.parse_rows(reader, format, false)?;
        info!("Loaded {} patient records", rows.len());
        Ok(rows)
    }

    /// Parse rows from reader; malformed rows are logged and skipped
    fn parse_rows<R: Read>(
        &self,
        reader: R,
        format: FileFormat,
        require_outcome: bool,
    ) -> Result<Vec<PatientRow>> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(true)
            .from_reader(reader);

        let header = Header::new(csv_reader.headers()?);
        header.require(&NUMERIC_FIELDS)?;
        header.require(&CATEGORICAL_FIELDS)?;
        if require_outcome {
            header.require(&[OUTCOME_FIELD])?;
        }
        let with_outcome = header.has(OUTCOME_FIELD);

        let mut rows = Vec::new();
        for (i, result) in csv_reader.records().enumerate() {
            let line = i + 1;
            let record = match result {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. }) => {
                    warn!("Skipping line {}: {}", line, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match Self::parse_row(&header, &record, with_outcome) {
                Ok((patient, outcome)) => {
                    if require_outcome && outcome.is_none() {
                        warn!("Skipping line {}: missing outcome", line);
                        continue;
                    }
                    rows.push(PatientRow {
                        line,
                        record: patient,
                        outcome,
                    });

                    if self.config.max_records > 0 && rows.len() >= self.config.max_records {
                        warn!("Reached maximum record limit: {}", self.config.max_records);
                        break;
                    }

                    if self.config.batch_size > 0 && rows.len() % self.config.batch_size == 0 {
                        debug!("Loaded {} records...", rows.len());
                    }
                }
                Err(e) => {
                    warn!("Skipping line {}: {}", line, e);
                }
            }
        }

        Ok(rows)
    }

    /// Parse a single patient row
    fn parse_row(
        header: &Header,
        record: &StringRecord,
        with_outcome: bool,
    ) -> std::result::Result<(PatientRecord, Option<u8>), String> {
        let get_f64 = |name: &str| -> std::result::Result<f64, String> {
            let raw = header.field(record, name).unwrap_or("");
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("invalid value {:?} for {}", raw, name))
        };
        let get_str = |name: &str| header.field(record, name).unwrap_or("").to_string();

        let patient = PatientRecord {
            age: get_f64("age")?,
            chest_pain_type: get_f64("chest_pain_type")?,
            blood_pressure: get_f64("blood_pressure")?,
            cholesterol: get_f64("cholesterol")?,
            max_heart_rate: get_f64("max_heart_rate")?,
            exercise_angina: get_f64("exercise_angina")?,
            plasma_glucose: get_f64("plasma_glucose")?,
            skin_thickness: get_f64("skin_thickness")?,
            insulin: get_f64("insulin")?,
            bmi: get_f64("bmi")?,
            diabetes_pedigree: get_f64("diabetes_pedigree")?,
            hypertension: get_f64("hypertension")?,
            gender: get_str("gender"),
            residence_type: get_str("residence_type"),
            smoking_status: get_str("smoking_status"),
        };

        let outcome = if with_outcome {
            match header.field(record, OUTCOME_FIELD) {
                Some("") | None => None,
                Some(raw) => match raw.parse::<f64>() {
                    Ok(v) if v == 0.0 || v == 1.0 => Some(v as u8),
                    _ => return Err(format!("invalid outcome {:?}", raw)),
                },
            }
        } else {
            None
        };

        Ok((patient, outcome))
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    const HEADER: &str = "age,gender,chest_pain_type,blood_pressure,cholesterol,max_heart_rate,\
exercise_angina,plasma_glucose,skin_thickness,insulin,bmi,diabetes_pedigree,hypertension,\
heart_disease,residence_type,smoking_status";

    fn csv_data() -> String {
        format!(
            "{}\n\
             54,Male,2,130,250,150,0,100,20,85,27.5,0.45,1,1,Urban,smokes\n\
             61,Female,1,140,270,120,1,130,25,95,31.0,0.60,1,0,Rural,never smoked\n\
             47,Female,0,120,nan-ish,160,0,90,18,70,22.1,0.30,0,1,Urban,unknown\n",
            HEADER
        )
    }

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_path("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path("data.tsv").unwrap(), FileFormat::Tsv);
        assert_eq!(FileFormat::from_path("data.csv.gz").unwrap(), FileFormat::GzippedCsv);
        assert_eq!(FileFormat::from_path("data.tsv.gz").unwrap(), FileFormat::GzippedTsv);
        assert!(FileFormat::from_path("data.parquet").is_err());
    }

    #[test]
    fn test_parse_labeled_csv_skips_malformed_rows() {
        let loader = DataLoader::new();
        let records = loader
            .parse_labeled(Cursor::new(csv_data()), FileFormat::Csv)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record.age, 54.0);
        assert_eq!(records[0].record.gender, "Male");
        assert_eq!(records[0].outcome, 1);
        assert_eq!(records[1].record.smoking_status, "never smoked");
        assert_eq!(records[1].outcome, 0);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let data = "age,gender\n50,Male\n";
        let loader = DataLoader::new();

        match loader.parse_labeled(Cursor::new(data), FileFormat::Csv) {
            Err(ClusterError::SchemaMismatch(column)) => assert_eq!(column, "chest_pain_type"),
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_outcome_column() {
        let header = HEADER.replace("heart_disease,", "");
        let data = format!("{}\n54,Male,2,130,250,150,0,100,20,85,27.5,0.45,1,Urban,smokes\n", header);
        let loader = DataLoader::new();

        assert!(matches!(
            loader.parse_labeled(Cursor::new(data.clone()), FileFormat::Csv),
            Err(ClusterError::SchemaMismatch(_))
        ));

        let rows = loader.parse_patients(Cursor::new(data), FileFormat::Csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].outcome, None);
        assert_eq!(rows[0].line, 1);
    }

    #[test]
    fn test_max_records() {
        let loader = DataLoader::with_config(LoaderConfig {
            max_records: 1,
            ..LoaderConfig::default()
        });
        let records = loader
            .parse_labeled(Cursor::new(csv_data()), FileFormat::Csv)
            .unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_ragged_row_is_skipped() {
        let data = format!(
            "{}\n\
             54,Male,2,130,250,150,0,100,20,85,27.5,0.45,1,1,Urban,smokes\n\
             61,Female,1,140\n\
             58,Female,1,140,270,120,1,130,25,95,31.0,0.60,1,0,Rural,never smoked\n",
            HEADER
        );
        let records = DataLoader::new()
            .parse_labeled(Cursor::new(data), FileFormat::Csv)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record.age, 54.0);
        assert_eq!(records[1].record.age, 58.0);
    }

    #[test]
    fn test_zero_batch_size_does_not_panic() {
        let loader = DataLoader::with_config(LoaderConfig {
            batch_size: 0,
            ..LoaderConfig::default()
        });
        let records = loader
            .parse_labeled(Cursor::new(csv_data()), FileFormat::Csv)
            .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_gzipped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv.gz");

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(csv_data().as_bytes()).unwrap();
        encoder.finish().unwrap();

        let records = DataLoader::new().load_labeled(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_tsv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.tsv");
        std::fs::write(&path, csv_data().replace(',', "\t")).unwrap();

        let rows = DataLoader::new().load_patients(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].record.residence_type, "Rural");
    }
}
