use clap::{Parser, Subcommand};
use illness_core::config::{ENV_DATA_DIR, ENV_GRID, ENV_REPORT_DIR, ENV_SEED};
use illness_core::{
    load_dataset, GridPreset, InferenceContext, IntelConfig, LabelEncoder, Predictor,
    ReportExporter, SymptomVocabulary,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "illness-intel")]
#[command(about = "Illness Intel disease predictor CLI")]
struct Cli {
    /// Directory holding dataset.csv, symptom_Description.csv and symptom_precaution.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Directory for generated reports
    #[arg(long, global = true)]
    report_dir: Option<PathBuf>,
    /// Hyperparameter grid: full or quick
    #[arg(long, global = true)]
    grid: Option<GridPreset>,
    /// Seed for the train/test split and the forest
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and print its evaluation
    Train,
    /// Train the model, predict from a comma-separated symptom list and write the report
    Predict {
        /// e.g. "cough, fever, headache"
        symptoms: String,
    },
    /// List the symptom vocabulary with its codes
    Vocab,
    /// List the diseases with their label indices
    Diseases,
}

impl Cli {
    /// Flags win over environment variables.
    fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            ENV_DATA_DIR => self.data_dir.as_ref().map(|p| p.display().to_string()),
            ENV_REPORT_DIR => self.report_dir.as_ref().map(|p| p.display().to_string()),
            ENV_GRID => self.grid.map(|g| g.to_string()),
            ENV_SEED => self.seed.map(|s| s.to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("illness_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = IntelConfig::from_lookup(|key| cli.lookup(key))?;

    match &cli.command {
        Some(Commands::Train) => {
            let context = train(&config)?;
            if let Some(summary) = context.summary() {
                println!("Best parameters: {}", summary.best_params);
                println!(
                    "Cross-validation accuracy: {:.4} ({} candidates)",
                    summary.cv_accuracy, summary.candidates_evaluated
                );
                println!(
                    "Trained on {} cases, evaluated on {}",
                    summary.n_train, summary.n_test
                );
                println!();
                println!("{}", summary.test_report);
            }
        }
        Some(Commands::Predict { symptoms }) => {
            let context = train(&config)?;
            let exporter = ReportExporter::new(config.report_dir())?;
            if let Some(retention) = config.report_retention() {
                exporter.prune_older_than(retention)?;
            }
            let prediction = Predictor::new(&context, &exporter).predict(symptoms)?;
            let diagnosis = &prediction.diagnosis;
            println!("Predicted Disease: {}", diagnosis.disease);
            println!("Confidence Score: {}", diagnosis.confidence_text());
            println!("Disease Description: {}", diagnosis.description);
            println!("Precaution: {}", diagnosis.precaution);
            if !diagnosis.unrecognised.is_empty() {
                println!(
                    "Unrecognised symptoms (ignored): {}",
                    diagnosis.unrecognised.join(", ")
                );
            }
            println!("Report: {}", prediction.report.path.display());
        }
        Some(Commands::Vocab) => {
            let dataset = load_dataset(config.data_dir())?;
            let vocabulary = SymptomVocabulary::from_table(&dataset.table);
            for (code, symptom) in vocabulary.iter() {
                println!("{code}\t{symptom}");
            }
        }
        Some(Commands::Diseases) => {
            let dataset = load_dataset(config.data_dir())?;
            let labels = LabelEncoder::from_table(&dataset.table);
            for label in 0..labels.n_classes() {
                println!(
                    "{label}\t{}",
                    labels.display_name(label).unwrap_or_default()
                );
            }
        }
        None => {
            println!("Use 'illness-intel --help' for commands");
        }
    }

    Ok(())
}

fn train(config: &IntelConfig) -> anyhow::Result<InferenceContext> {
    let dataset = load_dataset(config.data_dir())?;
    tracing::info!(
        "training with the {} grid, seed {}",
        config.grid(),
        config.seed()
    );
    Ok(InferenceContext::train(dataset, &config.training())?)
}
