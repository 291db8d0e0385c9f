use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use illness_core::{load_dataset, InferenceContext, IntelConfig, ReportExporter};

/// Main entry point for Illness Intel
///
/// Loads the symptom tables, trains the model, and then serves the web form and JSON API.
/// Training finishes before the listener is bound, so every request sees the trained model.
///
/// # Environment Variables
/// - `ILLNESS_INTEL_ADDR`: server address (default: "0.0.0.0:3000")
/// - `ILLNESS_INTEL_DATA_DIR`: directory holding the three CSV files (default: resolved `data/`)
/// - `ILLNESS_INTEL_REPORT_DIR`: directory for generated reports (default: "reports")
/// - `ILLNESS_INTEL_GRID`: hyperparameter grid, `full` or `quick` (default: "full")
/// - `ILLNESS_INTEL_SEED`: split and forest seed (default: 42)
/// - `ILLNESS_INTEL_REPORT_RETENTION_HOURS`: reports older than this are removed at startup,
///   0 keeps them forever (default: 24)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be found,
/// - loading or training fails,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("illness_intel_run=info".parse()?)
                .add_directive("illness_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = IntelConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!(
        "++ Loading data from {} (grid {}, seed {})",
        config.data_dir().display(),
        config.grid(),
        config.seed()
    );

    let exporter = ReportExporter::new(config.report_dir())?;
    if let Some(retention) = config.report_retention() {
        exporter.prune_older_than(retention)?;
    }

    let training_config = config.clone();
    let context = tokio::task::spawn_blocking(move || -> anyhow::Result<InferenceContext> {
        let dataset = load_dataset(training_config.data_dir())?;
        Ok(InferenceContext::train(dataset, &training_config.training())?)
    })
    .await??;

    if context.vocabulary().is_empty() {
        anyhow::bail!("trained model has an empty symptom vocabulary");
    }

    let app = api_rest::app(AppState::new(Arc::new(context), Arc::new(exporter)));

    tracing::info!("++ Starting Illness Intel on {}", config.addr());
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
