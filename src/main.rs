use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use kesra_io::{DatasetReader, ReportWriter, RunName};
use kesra_prep::{LabelMapping, StandardScaler, StratifiedSplit};
use kesra_rf::{
    evaluate_holdout, ArtifactBundle, ClassWeight, MaxFeatures, RandomForestConfig, TreeDiagram,
};

#[derive(Parser)]
#[command(name = "kesra")]
#[command(about = "Regional welfare classification from socioeconomic indicators")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Random Forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the ensemble
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 5)]
    min_samples_split: usize,

    /// Minimum samples required in each leaf
    #[arg(long, default_value_t = 2)]
    min_samples_leaf: usize,

    /// Features drawn per split: "sqrt", "log2", "all", a count, or a fraction
    #[arg(long, default_value = "sqrt")]
    max_features: String,

    /// Class weighting: "uniform" or "balanced"
    #[arg(long, default_value = "balanced")]
    class_weight: String,
}

#[derive(Subcommand)]
enum Command {
    /// Train a welfare classifier and write evaluation artifacts
    Train {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Run name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        run: String,

        /// Output directory for artifacts
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Fraction of each class held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        /// Holdout accuracy target; a shortfall logs a warning
        #[arg(long, default_value_t = 0.75)]
        min_accuracy: f64,

        /// Abort on a holdout accuracy shortfall, before any artifact is written
        #[arg(long, default_value_t = false)]
        enforce_min_accuracy: bool,

        /// Depth limit of the persisted tree diagram
        #[arg(long, default_value_t = 3)]
        diagram_depth: usize,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Classify one region from four raw indicator values
    Predict {
        /// Path to the trained artifact bundle
        #[arg(long)]
        bundle: PathBuf,

        /// Comma-separated indicator values, in canonical column order
        #[arg(long)]
        values: String,
    },

    /// Load an artifact bundle and print its structure
    Inspect {
        /// Path to the trained artifact bundle
        #[arg(long)]
        bundle: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    run: String,
    n_rows: usize,
    n_train: usize,
    n_test: usize,
    class_distribution: BTreeMap<String, usize>,
    train_accuracy: f64,
    holdout_accuracy: f64,
    n_trees: usize,
    n_features: usize,
    top_features: Vec<FeatureOutput>,
    bundle_path: PathBuf,
}

#[derive(Serialize)]
struct FeatureOutput {
    name: String,
    importance: f64,
    rank: usize,
}

#[derive(Serialize)]
struct PredictOutput {
    label: String,
    code: usize,
    probabilities: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct InspectOutput {
    path: PathBuf,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    feature_names: Vec<String>,
    classes: Vec<ClassOutput>,
    scaler_means: Vec<f64>,
    scaler_stddevs: Vec<f64>,
}

#[derive(Serialize)]
struct ClassOutput {
    code: usize,
    label: String,
}

fn parse_max_features(s: &str) -> Result<MaxFeatures> {
    match s {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other => {
            if let Ok(count) = other.parse::<usize>() {
                Ok(MaxFeatures::Fixed(count))
            } else if let Ok(fraction) = other.parse::<f64>() {
                Ok(MaxFeatures::Fraction(fraction))
            } else {
                anyhow::bail!(
                    "unknown max-features strategy: {other} (expected sqrt, log2, all, a count, or a fraction)"
                )
            }
        }
    }
}

fn parse_class_weight(s: &str) -> Result<ClassWeight> {
    match s {
        "uniform" => Ok(ClassWeight::Uniform),
        "balanced" => Ok(ClassWeight::Balanced),
        other => anyhow::bail!("unknown class weight: {other} (expected uniform or balanced)"),
    }
}

fn parse_values(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid numeric value \"{}\"", v.trim()))
        })
        .collect()
}

fn accuracy_of(predictions: &[usize], actual: &[usize]) -> f64 {
    let correct = predictions
        .iter()
        .zip(actual)
        .filter(|&(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            run,
            output_dir,
            test_fraction,
            min_accuracy,
            enforce_min_accuracy,
            diagram_depth,
            forest,
        } => {
            let run_name = RunName::new(run.clone())?;

            // 1. Read and validate the dataset
            let dataset = DatasetReader::new(&data)
                .read()
                .context("failed to read dataset CSV")?;
            let class_distribution: BTreeMap<String, usize> = dataset
                .class_distribution()
                .into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect();
            info!(
                n_rows = dataset.n_rows(),
                distribution = ?class_distribution,
                "dataset loaded"
            );

            // 2. Encode labels and split with stratification
            let mapping = LabelMapping::fit(dataset.labels())?;
            let codes = mapping.encode_all(dataset.labels())?;
            let split = StratifiedSplit::new(test_fraction)?
                .with_seed(cli.seed)
                .split(&codes)?;
            info!(
                n_train = split.n_train(),
                n_test = split.n_test(),
                "dataset partitioned"
            );

            let gather = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
                (
                    indices
                        .iter()
                        .map(|&i| dataset.feature_rows()[i].clone())
                        .collect(),
                    indices.iter().map(|&i| codes[i]).collect(),
                )
            };
            let (train_raw, train_codes) = gather(&split.train_indices);
            let (test_raw, test_codes) = gather(&split.test_indices);

            // 3. Fit the scaler on the training subset only
            let scaler = StandardScaler::fit(&train_raw)?;
            let train_scaled = scaler.transform(&train_raw)?;
            let test_scaled = scaler.transform(&test_raw)?;

            // 4. Train the forest
            let feature_names = dataset.feature_names();
            let config = RandomForestConfig::new(forest.n_trees)?
                .with_max_depth(Some(forest.max_depth))
                .with_min_samples_split(forest.min_samples_split)
                .with_min_samples_leaf(forest.min_samples_leaf)
                .with_max_features(parse_max_features(&forest.max_features)?)
                .with_class_weight(parse_class_weight(&forest.class_weight)?)
                .with_seed(cli.seed);
            let result = config
                .fit(&train_scaled, &train_codes, &feature_names)
                .context("forest training failed")?;

            // 5. Evaluate on both subsets
            let train_predictions = result.forest().predict_batch(&train_scaled)?;
            let train_accuracy = accuracy_of(&train_predictions, &train_codes);
            let eval =
                evaluate_holdout(result.forest(), &test_scaled, &test_codes, mapping.labels())
                    .context("holdout evaluation failed")?;
            let top = &result.importances()[0];
            info!(
                train_accuracy,
                holdout_accuracy = eval.accuracy,
                top_feature = %top.name,
                top_importance = top.importance,
                "forest evaluated"
            );

            // 6. Accuracy target gate, checked before anything is written
            if eval.accuracy < min_accuracy {
                if enforce_min_accuracy {
                    anyhow::bail!(
                        "holdout accuracy {:.4} below required minimum {:.4}",
                        eval.accuracy,
                        min_accuracy
                    );
                }
                warn!(
                    holdout_accuracy = eval.accuracy,
                    min_accuracy, "holdout accuracy below target"
                );
            }

            // 7. Write the metrics report and chart payloads
            let writer = ReportWriter::new(&output_dir, run_name)?;
            let class_rows: Vec<(&str, f64, f64, f64, usize)> = eval
                .per_class
                .iter()
                .map(|c| (c.label.as_str(), c.precision, c.recall, c.f1, c.support))
                .collect();
            let macro_avg = (
                eval.macro_avg.precision,
                eval.macro_avg.recall,
                eval.macro_avg.f1,
                eval.macro_avg.support,
            );
            let weighted_avg = (
                eval.weighted_avg.precision,
                eval.weighted_avg.recall,
                eval.weighted_avg.f1,
                eval.weighted_avg.support,
            );
            writer.write_metrics(eval.accuracy, &class_rows, macro_avg, weighted_avg)?;
            writer.write_confusion_matrix(mapping.labels(), eval.confusion.as_rows())?;

            let importance_rows: Vec<(&str, f64, usize)> = result
                .importances()
                .iter()
                .map(|f| (f.name.as_str(), f.importance, f.rank))
                .collect();
            writer.write_feature_importance(&importance_rows)?;
            writer.write_class_metrics(&class_rows)?;

            let diagram =
                TreeDiagram::from_forest(result.forest(), diagram_depth, mapping.labels())?;
            writer.write_tree_diagram(&diagram)?;

            // 8. Save the artifact bundle
            let top_features: Vec<FeatureOutput> = result
                .importances()
                .iter()
                .map(|f| FeatureOutput {
                    name: f.name.clone(),
                    importance: f.importance,
                    rank: f.rank,
                })
                .collect();
            let n_features = feature_names.len();
            let bundle = ArtifactBundle::new(result.into_forest(), scaler, mapping, feature_names)?;
            let bundle_path = writer.bundle_path();
            bundle
                .save(&bundle_path)
                .context("failed to save artifact bundle")?;
            info!(path = %bundle_path.display(), "artifact bundle saved");

            // 9. Print summary
            let output = TrainOutput {
                run,
                n_rows: dataset.n_rows(),
                n_train: split.n_train(),
                n_test: split.n_test(),
                class_distribution,
                train_accuracy,
                holdout_accuracy: eval.accuracy,
                n_trees: forest.n_trees,
                n_features,
                top_features,
                bundle_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict { bundle, values } => {
            // 1. Load the bundle
            let bundle = ArtifactBundle::load(&bundle).context("failed to load artifact bundle")?;
            info!(
                n_trees = bundle.forest().n_trees(),
                n_features = bundle.forest().n_features(),
                n_classes = bundle.forest().n_classes(),
                "bundle loaded"
            );

            // 2. Parse and classify the raw indicator row
            let row = parse_values(&values)?;
            let prediction = bundle.classify(&row).context("classification failed")?;

            // 3. Print the decoded label with per-class probabilities
            let probabilities: BTreeMap<String, f64> = bundle
                .mapping()
                .labels()
                .iter()
                .cloned()
                .zip(prediction.probabilities.iter().copied())
                .collect();
            let output = PredictOutput {
                label: prediction.label,
                code: prediction.code,
                probabilities,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Inspect { bundle } => {
            let path = bundle;
            let bundle = ArtifactBundle::load(&path).context("failed to load artifact bundle")?;

            let classes: Vec<ClassOutput> = bundle
                .mapping()
                .labels()
                .iter()
                .enumerate()
                .map(|(code, label)| ClassOutput {
                    code,
                    label: label.clone(),
                })
                .collect();
            let output = InspectOutput {
                path,
                n_trees: bundle.forest().n_trees(),
                n_features: bundle.forest().n_features(),
                n_classes: bundle.forest().n_classes(),
                feature_names: bundle.feature_names().to_vec(),
                classes,
                scaler_means: bundle.scaler().means().to_vec(),
                scaler_stddevs: bundle.scaler().stddevs().to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
