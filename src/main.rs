use anyhow::{Context, Result};
use hdcluster::cli::{parse_args, setup_logging, BatchArgs, ClassifyArgs, Commands, InspectArgs, ReferenceArgs};
use hdcluster::data::loader::DataLoader;
use hdcluster::predict::classifier::{utils as classify_utils, Classifier};
use hdcluster::training::ReferenceModel;
use std::time::Instant;
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", hdcluster::info());

    let result = match cli.command {
        Commands::Classify(args) => run_classify(args),
        Commands::Batch(args) => run_batch(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Load the historical dataset and fit every frozen artifact once
fn build_reference(args: &ReferenceArgs) -> Result<ReferenceModel> {
    let config = args.model_config().context("Invalid model configuration")?;
    info!("Model configuration: {:?}", config);

    let records = DataLoader::new()
        .load_labeled(&args.data)
        .with_context(|| format!("Failed to load reference data from {:?}", args.data))?;

    let start = Instant::now();
    let model = ReferenceModel::fit(&records, config).context("Failed to fit reference model")?;
    info!(
        "Reference model fitted in {}",
        hdcluster::utils::format_duration(start.elapsed().as_secs_f64())
    );

    Ok(model)
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let model = build_reference(&args.reference)?;
    let classifier = Classifier::new(&model);

    let record = args.patient.to_record();
    let classification = classifier
        .classify(&record)
        .context("Classification failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        println!("{}", classification.verdict);
    }

    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    info!("Input file: {:?}", args.input);
    info!("Output file: {:?}", args.output);

    if !matches!(args.format.as_str(), "csv" | "json") {
        anyhow::bail!("Unsupported output format: {}", args.format);
    }

    let model = build_reference(&args.reference)?;

    let rows = DataLoader::new()
        .load_patients(&args.input)
        .with_context(|| format!("Failed to load patients from {:?}", args.input))?;

    let classifier = Classifier::new(&model).with_progress(true);
    let start = Instant::now();
    let result = classifier
        .classify_batch(&rows)
        .context("Batch classification failed")?;
    info!(
        "Classified {} records in {}",
        result.entries.len(),
        hdcluster::utils::format_duration(start.elapsed().as_secs_f64())
    );

    result.summary.print();
    info!(
        "Label map covers {} of {} reference clusters",
        classifier.model().label_map().len(),
        classifier.model().clustering().n_clusters
    );

    hdcluster::utils::ensure_parent_dir(&args.output)?;
    if args.format == "json" {
        classify_utils::save_classifications_to_json(&result, &args.output)?;
    } else {
        classify_utils::save_classifications_to_csv(&result, &args.output)?;
    }

    info!("Classifications saved to: {:?}", args.output);

    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let model = build_reference(&args.reference)?;
    let summary = model.summary();

    summary.print();

    if let Some(output) = args.output {
        hdcluster::utils::ensure_parent_dir(&output)?;
        let report = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&output, report)
            .with_context(|| format!("Failed to write summary to {:?}", output))?;
        info!("Summary saved to: {:?}", output);
    }

    if let Some(path) = args.save_config {
        hdcluster::utils::ensure_parent_dir(&path)?;
        model
            .config()
            .save(&path)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        info!("Configuration saved to: {:?}", path);
    }

    Ok(())
}
