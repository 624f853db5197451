use crate::data::PatientRecord;
use crate::model::ModelConfig;
use crate::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hdcluster: density-cluster heart-disease classifier
#[derive(Parser, Debug)]
#[command(name = "hdcluster")]
#[command(about = "Assign patients to DBSCAN clusters of a reference dataset")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single patient given on the command line
    Classify(ClassifyArgs),

    /// Classify every patient in a CSV/TSV file
    Batch(BatchArgs),

    /// Fit the reference model and describe its clusters
    Inspect(InspectArgs),
}

/// Options for building the reference model
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Historical dataset with a heart_disease column (CSV, TSV, optionally gzipped)
    #[arg(short, long, required = true)]
    pub data: PathBuf,

    /// Model configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// DBSCAN radius in projected space
    #[arg(long)]
    pub eps: Option<f64>,

    /// DBSCAN minimum neighborhood size
    #[arg(long)]
    pub min_pts: Option<usize>,
}

impl ReferenceArgs {
    /// Defaults, then the config file, then command-line overrides
    pub fn model_config(&self) -> Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::load(path)?,
            None => ModelConfig::default(),
        };
        if let Some(eps) = self.eps {
            config.eps = eps;
        }
        if let Some(min_pts) = self.min_pts {
            config.min_pts = min_pts;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Patient fields for single classification
#[derive(Args, Debug)]
pub struct PatientArgs {
    #[arg(long)]
    pub age: f64,
    #[arg(long)]
    pub gender: String,
    #[arg(long)]
    pub chest_pain_type: f64,
    #[arg(long)]
    pub blood_pressure: f64,
    #[arg(long)]
    pub cholesterol: f64,
    #[arg(long)]
    pub max_heart_rate: f64,
    #[arg(long)]
    pub exercise_angina: f64,
    #[arg(long)]
    pub plasma_glucose: f64,
    #[arg(long)]
    pub skin_thickness: f64,
    #[arg(long)]
    pub insulin: f64,
    #[arg(long)]
    pub bmi: f64,
    #[arg(long)]
    pub diabetes_pedigree: f64,
    #[arg(long)]
    pub hypertension: f64,
    #[arg(long)]
    pub residence_type: String,
    #[arg(long)]
    pub smoking_status: String,
}

impl PatientArgs {
    pub fn to_record(&self) -> PatientRecord {
        PatientRecord {
            age: self.age,
            chest_pain_type: self.chest_pain_type,
            blood_pressure: self.blood_pressure,
            cholesterol: self.cholesterol,
            max_heart_rate: self.max_heart_rate,
            exercise_angina: self.exercise_angina,
            plasma_glucose: self.plasma_glucose,
            skin_thickness: self.skin_thickness,
            insulin: self.insulin,
            bmi: self.bmi,
            diabetes_pedigree: self.diabetes_pedigree,
            hypertension: self.hypertension,
            gender: self.gender.clone(),
            residence_type: self.residence_type.clone(),
            smoking_status: self.smoking_status.clone(),
        }
    }
}

/// Single classification arguments
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub patient: PatientArgs,

    /// Print the full classification as JSON
    #[arg(long)]
    pub json: bool,
}

/// Batch classification arguments
#[derive(Parser, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Patients to classify (CSV or TSV)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Output file for classifications
    #[arg(short, long, default_value = "classifications.csv")]
    pub output: PathBuf,

    /// Output format (csv, json)
    #[arg(short, long, default_value = "csv")]
    pub format: String,
}

/// Inspection arguments
#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Write the summary as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the effective model configuration (JSON) to this file
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT: [&str; 30] = [
        "--age", "54",
        "--gender", "Male",
        "--chest-pain-type", "2",
        "--blood-pressure", "130",
        "--cholesterol", "250",
        "--max-heart-rate", "150",
        "--exercise-angina", "0",
        "--plasma-glucose", "100",
        "--skin-thickness", "20",
        "--insulin", "85",
        "--bmi", "27.5",
        "--diabetes-pedigree", "0.45",
        "--hypertension", "1",
        "--residence-type", "Urban",
        "--smoking-status", "never smoked",
    ];

    #[test]
    fn test_classify_parse() {
        let mut argv = vec!["hdcluster", "classify", "-d", "data.csv", "--eps", "2"];
        argv.extend(PATIENT);
        let cli = Cli::parse_from(argv);

        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.reference.data, PathBuf::from("data.csv"));
                assert_eq!(args.reference.eps, Some(2.0));

                let record = args.patient.to_record();
                assert_eq!(record.age, 54.0);
                assert_eq!(record.smoking_status, "never smoked");
                assert!(!args.json);
            }
            _ => panic!("Expected Classify command"),
        }
    }

    #[test]
    fn test_batch_parse() {
        let cli = Cli::parse_from([
            "hdcluster", "batch",
            "-d", "data.csv",
            "-i", "patients.csv",
            "-o", "out.json",
            "-f", "json",
        ]);

        match cli.command {
            Commands::Batch(args) => {
                assert_eq!(args.input, PathBuf::from("patients.csv"));
                assert_eq!(args.output, PathBuf::from("out.json"));
                assert_eq!(args.format, "json");
            }
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_model_config_overrides() {
        let cli = Cli::parse_from([
            "hdcluster", "inspect", "-d", "data.csv", "--min-pts", "8",
            "--save-config", "effective.json",
        ]);

        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.save_config, Some(PathBuf::from("effective.json")));
                let config = args.reference.model_config().unwrap();
                assert_eq!(config.min_pts, 8);
                assert_eq!(config.eps, 3.0);
            }
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["hdcluster", "inspect", "-d", "data.csv", "--eps", "0"]);

        match cli.command {
            Commands::Inspect(args) => assert!(args.reference.model_config().is_err()),
            _ => panic!("Expected Inspect command"),
        }
    }
}
