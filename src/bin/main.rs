//! smosvm Command Line Interface
//!
//! Train, evaluate and use SMO-trained SVM models on delimited text data
//! (one sample per line, label in the last column).

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use smosvm::api::{VariantParams, SVM};
use smosvm::core::{Result, SVMError, SVMModel, TrainingConfig};
use smosvm::data::{Dataset, Delimiter};
use smosvm::kernel::KernelFunction;
use smosvm::persistence::SerializableModel;
use smosvm::utils::scaling::{fit_transform, ScalingMethod};
use smosvm::utils::validation;
use smosvm::{CostSensitiveParams, EvaluationMetrics, MarginCalibratedParams, SoftMarginParams};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "smosvm")]
#[command(about = "SMO-trained binary SVM classifiers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on labeled data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliVariant {
    #[value(name = "soft-margin")]
    SoftMargin,
    #[value(name = "cost-sensitive")]
    CostSensitive,
    #[value(name = "margin-calibrated")]
    MarginCalibrated,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliKernel {
    Linear,
    Rbf,
}

#[derive(ValueEnum, Clone, Debug)]
enum CliScalingMethod {
    /// Min-Max scaling to [-1, 1] range
    #[value(name = "minmax")]
    MinMax,
    /// Standard score (Z-score) normalization
    #[value(name = "standard")]
    StandardScore,
    /// Unit scaling by maximum absolute value
    #[value(name = "unit")]
    UnitScale,
}

impl From<CliScalingMethod> for ScalingMethod {
    fn from(cli_method: CliScalingMethod) -> Self {
        match cli_method {
            CliScalingMethod::MinMax => ScalingMethod::MinMax {
                min_val: -1.0,
                max_val: 1.0,
            },
            CliScalingMethod::StandardScore => ScalingMethod::StandardScore,
            CliScalingMethod::UnitScale => ScalingMethod::UnitScale,
        }
    }
}

#[derive(Args)]
struct DataArgs {
    /// Data file, one sample per line with the label last
    #[arg(long)]
    data: PathBuf,

    /// Column delimiter: "whitespace", "tab" or a single character
    #[arg(long, default_value = "whitespace", value_parser = parse_delimiter)]
    delimiter: Delimiter,
}

#[derive(Args)]
struct TrainArgs {
    #[command(flatten)]
    input: DataArgs,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// SVM variant
    #[arg(long, value_enum, default_value = "soft-margin")]
    variant: CliVariant,

    /// Box constraint of the soft-margin variant
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Misclassification cost of the positive class
    #[arg(long, default_value = "1.0")]
    cp: f64,

    /// Misclassification cost of the negative class
    #[arg(long, default_value = "1.0")]
    cn: f64,

    /// Margin factor of the positive class, in (0, 1]
    #[arg(long, default_value = "1.0")]
    ap: f64,

    /// Margin factor of the negative class, in (0, 1]
    #[arg(long, default_value = "1.0")]
    an: f64,

    /// Flat parameter vector, e.g. "600,100,1.3" for cost-sensitive with an
    /// RBF width of 1.3; overrides the individual parameter and kernel flags
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    params: Option<Vec<f64>>,

    /// Kernel function
    #[arg(long, value_enum, default_value = "linear")]
    kernel: CliKernel,

    /// RBF kernel width
    #[arg(long, default_value = "1.0")]
    width: f64,

    /// Maximum number of SMO passes
    #[arg(long, default_value = "100")]
    max_iterations: usize,

    /// KKT tolerance
    #[arg(long, default_value = "0.0001")]
    tolerance: f64,

    /// Minimum accepted multiplier change
    #[arg(long, default_value = "0.00001")]
    min_step: f64,

    /// Random seed for reproducible training
    #[arg(long)]
    seed: Option<u64>,

    /// Feature scaling method
    #[arg(long)]
    feature_scaling: Option<CliScalingMethod>,

    /// Drop samples with NaN or infinite features instead of failing
    #[arg(long)]
    drop_non_finite: bool,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    #[command(flatten)]
    input: DataArgs,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show decision values
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    #[command(flatten)]
    input: DataArgs,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn parse_delimiter(value: &str) -> std::result::Result<Delimiter, String> {
    match value {
        "whitespace" | "space" => Ok(Delimiter::Whitespace),
        "tab" | "\\t" => Ok(Delimiter::Char('\t')),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Delimiter::Char(c)),
                _ => Err(format!(
                    "expected \"whitespace\", \"tab\" or a single character, got \"{other}\""
                )),
            }
        }
    }
}

fn variant_params(args: &TrainArgs) -> Result<(VariantParams, KernelFunction)> {
    let name = args
        .variant
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default();
    if let Some(flat) = &args.params {
        return VariantParams::from_flat(&name, flat);
    }

    let params = match args.variant {
        CliVariant::SoftMargin => VariantParams::SoftMargin(SoftMarginParams::new(args.c)?),
        CliVariant::CostSensitive => {
            VariantParams::CostSensitive(CostSensitiveParams::new(args.cp, args.cn)?)
        }
        CliVariant::MarginCalibrated => VariantParams::MarginCalibrated(
            MarginCalibratedParams::new(args.cp, args.cn, args.ap, args.an)?,
        ),
    };
    let kernel = match args.kernel {
        CliKernel::Linear => KernelFunction::Linear,
        CliKernel::Rbf => KernelFunction::rbf(args.width)?,
    };
    Ok((params, kernel))
}

fn load_dataset(input: &DataArgs) -> Result<Dataset> {
    info!("Loading data from: {:?}", input.data);
    let dataset = Dataset::from_file(&input.data, input.delimiter)?;
    info!(
        "Loaded {} samples with {} features",
        dataset.len(),
        dataset.dim()
    );
    Ok(dataset)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let (params, kernel) = variant_params(&args)?;
    info!("Training {params} with {kernel} kernel");

    let mut dataset = load_dataset(&args.input)?;
    if args.drop_non_finite {
        dataset = dataset.retain_finite()?;
    }
    validation::validate_training_set(&dataset)?;

    let (pos, neg, ratio) = validation::check_label_balance(&dataset);
    info!("Class balance: {pos} positive, {neg} negative (ratio {ratio:.3})");

    let scaling = match args.feature_scaling.clone() {
        Some(method) => {
            info!("Using feature scaling: {method:?}");
            let (scaled, scaling) = fit_transform(&dataset, method.into())?;
            dataset = scaled;
            Some(scaling)
        }
        None => None,
    };

    let mut config = TrainingConfig::default()
        .with_max_iterations(args.max_iterations)
        .with_tolerance(args.tolerance)
        .with_min_step(args.min_step);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let classifier = SVM::new(params)
        .with_kernel(kernel)
        .with_config(config)
        .train(&dataset)?;

    let info = classifier.info();
    info!("Training completed in {} passes", info.report.iterations);
    if !info.report.converged {
        warn!(
            "Training stopped after {} passes without converging",
            info.report.iterations
        );
    }
    info!("Support vectors: {}", info.n_support_vectors);
    info!("Bias: {:.6}", info.bias);

    let mut serializable = SerializableModel::from_classifier(&classifier);
    if let Some(scaling) = scaling {
        serializable = serializable.with_scaling(scaling);
    }
    serializable.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    let metrics = classifier.evaluate_training_set();
    info!(
        "Training accuracy: {:.2}% {:?}",
        metrics.accuracy() * 100.0,
        metrics.as_map()
    );

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_model();

    let dataset = serializable_model.prepare(load_dataset(&args.input)?)?;
    check_dimensions(&serializable_model, &dataset)?;
    info!(
        "Making predictions using model with {} support vectors",
        serializable_model.metadata.n_support_vectors
    );
    let predictions = model.predict_batch(dataset.features());

    match args.output {
        Some(output_path) => {
            let file = File::create(&output_path).map_err(SVMError::IoError)?;
            write_predictions(BufWriter::new(file), &predictions, args.confidence)?;
            info!("Predictions saved to: {output_path:?}");
        }
        None => {
            let stdout = std::io::stdout();
            write_predictions(stdout.lock(), &predictions, args.confidence)?;
        }
    }

    Ok(())
}

fn write_predictions<W: Write>(
    mut writer: W,
    predictions: &[smosvm::Prediction],
    confidence: bool,
) -> Result<()> {
    writeln!(writer, "# Predictions for {} samples", predictions.len())?;
    writeln!(
        writer,
        "# Format: sample_index predicted_label{}",
        if confidence { " decision_value" } else { "" }
    )?;
    for (i, pred) in predictions.iter().enumerate() {
        if confidence {
            writeln!(writer, "{} {:.0} {:.6}", i, pred.label, pred.decision_value)?;
        } else {
            writeln!(writer, "{} {:.0}", i, pred.label)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn check_dimensions(model: &SerializableModel, dataset: &Dataset) -> Result<()> {
    if model.metadata.n_features != dataset.dim() {
        return Err(SVMError::DimensionMismatch {
            expected: model.metadata.n_features,
            actual: dataset.dim(),
        });
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_model();

    let dataset = serializable_model.prepare(load_dataset(&args.input)?)?;
    check_dimensions(&serializable_model, &dataset)?;
    let predictions = model.predict_batch(dataset.features());
    let metrics = EvaluationMetrics::from_predictions(&predictions, dataset.labels());

    println!("=== Model Evaluation ===");
    serializable_model.print_summary();

    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", metrics.accuracy() * 100.0);
    println!("  Counts:   {:?}", metrics.as_map());

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = &serializable_model.model;

    serializable_model.print_summary();

    println!("\nSupport Vector Details:");
    println!("  Total: {}", model.n_support_vectors());

    println!("\nAlpha*Y values:");
    let weights = model.weights();
    let n_show = weights.len().min(10);
    for (i, w) in weights.iter().enumerate().take(n_show) {
        println!("  α{i}*y{i}: {w:.6}");
    }
    if weights.len() > n_show {
        println!("  ... ({} more)", weights.len() - n_show);
    }

    Ok(())
}
