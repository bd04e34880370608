use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordfarm_core::{EnvValues, Pipeline, PipelineConfig};

/// Reads the raw pipeline settings from the process environment.
fn env_values() -> EnvValues {
    let var = |name: &str| std::env::var(name).ok();
    EnvValues {
        input: var("WORDFARM_INPUT"),
        output_dir: var("WORDFARM_OUTPUT_DIR"),
        strategy: var("WORDFARM_STRATEGY"),
        normalizers: var("WORDFARM_NORMALIZERS"),
        writers: var("WORDFARM_WRITERS"),
        archivers: var("WORDFARM_ARCHIVERS"),
        export_path: var("WORDFARM_EXPORT"),
    }
}

/// Main entry point for a configured wordfarm run
///
/// Runs the full pipeline once: ingest the word list, write one artifact per word, report
/// directory sizes, then zip each top-level directory. The text report goes to stdout and
/// logs go to stderr.
///
/// # Environment Variables
/// - `WORDFARM_INPUT`: word list to read (required)
/// - `WORDFARM_OUTPUT_DIR`: output root (default: "output")
/// - `WORDFARM_STRATEGY`: `sequential` or `parallel` for both ingestion and writing
/// - `WORDFARM_NORMALIZERS`, `WORDFARM_WRITERS`, `WORDFARM_ARCHIVERS`: concurrency limits
/// - `WORDFARM_EXPORT`: optional path for the capitalized word list
/// - `WORDFARM_REPORT_JSON`: when set, also print the run report as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("wordfarm=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PipelineConfig::from_env_values(env_values())
        .context("invalid wordfarm configuration")?;
    tracing::info!(
        "starting {} run: {} -> {}",
        config.run_label(),
        config.input_path().display(),
        config.output_root().display()
    );

    let report = Pipeline::new(config)?
        .run()
        .await
        .context("pipeline run failed")?;

    if std::env::var_os("WORDFARM_REPORT_JSON").is_some() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
