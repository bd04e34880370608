use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordfarm_core::accountant::account;
use wordfarm_core::archiver::archive_all;
use wordfarm_core::constants::{DEFAULT_OUTPUT_DIR, TIMINGS_FILENAME};
use wordfarm_core::export::write_word_list;
use wordfarm_core::report::{render_archive_failures, render_size_report, render_stats};
use wordfarm_core::{
    capitalize_all, Pipeline, PipelineConfig, PipelineTuning, ReportSink, Strategy, WordStats,
};

#[derive(Parser)]
#[command(name = "wordfarm")]
#[command(about = "Materialize a word list into sharded files, then measure and archive them")]
struct Cli {
    /// Output root directory
    #[arg(long, short, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,
    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: ingest, write, sizes, archive
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// Strategy for writing artifacts
        #[arg(long, value_enum, default_value_t = StrategyArg::Parallel)]
        write: StrategyArg,
        /// Concurrent artifact writers
        #[arg(long)]
        writers: Option<usize>,
        /// Concurrent archive builds
        #[arg(long)]
        archivers: Option<usize>,
        /// Do not append this run to the timing ledger
        #[arg(long)]
        no_timings: bool,
    },
    /// Read the word list and print statistics
    Ingest {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Read the word list and write one artifact per word
    Write {
        #[command(flatten)]
        input: InputArgs,
        /// Strategy for writing artifacts
        #[arg(long, value_enum, default_value_t = StrategyArg::Parallel)]
        write: StrategyArg,
        /// Concurrent artifact writers
        #[arg(long)]
        writers: Option<usize>,
    },
    /// Print the size of every top-level directory under the output root
    Sizes,
    /// Zip every top-level directory under the output root
    Archive {
        /// Concurrent archive builds
        #[arg(long)]
        archivers: Option<usize>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Word list, one word per line
    input: PathBuf,
    /// Strategy for reading the word list
    #[arg(long, value_enum, default_value_t = StrategyArg::Sequential)]
    ingest: StrategyArg,
    /// Normalizer tasks for parallel ingestion
    #[arg(long)]
    normalizers: Option<usize>,
    /// Keep parallel ingestion order as produced instead of sorting it
    #[arg(long)]
    unordered: bool,
    /// Also write the capitalized word list to this file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Sequential,
    Parallel,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Parallel => Strategy::Parallel,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

impl Format {
    fn sink(self) -> Arc<ReportSink> {
        match self {
            Format::Text => Arc::new(ReportSink::stdout()),
            Format::Json | Format::Yaml => Arc::new(ReportSink::silent()),
        }
    }

    /// Prints `value` in structured formats. Text output has already been streamed.
    fn emit<T: Serialize>(self, value: &T) -> anyhow::Result<()> {
        match self {
            Format::Text => {}
            Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
        }
        Ok(())
    }
}

fn tuning(
    normalizers: Option<usize>,
    writers: Option<usize>,
    archivers: Option<usize>,
) -> PipelineTuning {
    let defaults = PipelineTuning::default();
    PipelineTuning {
        normalizers: normalizers.unwrap_or(defaults.normalizers),
        writers: writers.unwrap_or(defaults.writers),
        archivers: archivers.unwrap_or(defaults.archivers),
    }
}

fn pipeline_config(output: PathBuf, tuning: PipelineTuning, input: InputArgs) -> PipelineConfig {
    PipelineConfig::new(input.input, output)
        .with_ingest_strategy(input.ingest.into())
        .with_stable_order(!input.unordered)
        .with_export_path(input.export)
        .with_tuning(tuning)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("wordfarm=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let sink = cli.format.sink();

    match cli.command {
        Commands::Run {
            input,
            write,
            writers,
            archivers,
            no_timings,
        } => {
            let timings = (!no_timings).then(|| cli.output.join(TIMINGS_FILENAME));
            let config = pipeline_config(
                cli.output,
                tuning(input.normalizers, writers, archivers),
                input,
            )
            .with_write_strategy(write.into())
            .with_timings_path(timings);

            let report = Pipeline::new(config)?
                .with_sink(sink)
                .run()
                .await
                .context("pipeline run failed")?;
            cli.format.emit(&report)?;
        }
        Commands::Ingest { input } => {
            let config = pipeline_config(
                cli.output,
                tuning(input.normalizers, None, None),
                input,
            );
            let pipeline = Pipeline::new(config)?.with_sink(Arc::clone(&sink));
            let collection = pipeline.ingest().await.context("failed to read word list")?;
            let stats = WordStats::analyze(collection.words());
            render_stats(&stats, &sink);

            if let Some(path) = pipeline.config().export_path() {
                let capitalized = capitalize_all(collection.words());
                write_word_list(&capitalized, path).context("failed to export word list")?;
            }
            cli.format.emit(&stats)?;
        }
        Commands::Write {
            input,
            write,
            writers,
        } => {
            let config = pipeline_config(
                cli.output,
                tuning(input.normalizers, writers, None),
                input,
            )
            .with_write_strategy(write.into());
            let pipeline = Pipeline::new(config)?.with_sink(sink);
            let collection = pipeline.ingest().await.context("failed to read word list")?;
            let summary = pipeline
                .write(collection.words())
                .await
                .context("writer pool failed")?;
            cli.format.emit(&summary)?;
        }
        Commands::Sizes => {
            let root = cli.output.clone();
            let report = tokio::task::spawn_blocking(move || account(&root))
                .await?
                .with_context(|| format!("failed to measure {}", cli.output.display()))?;
            render_size_report(&report, &sink);
            cli.format.emit(&report)?;
        }
        Commands::Archive { archivers } => {
            let limit = tuning(None, None, archivers).archivers;
            anyhow::ensure!(limit > 0, "--archivers must be at least 1");
            let summary = archive_all(&cli.output, limit, Arc::clone(&sink))
                .await
                .with_context(|| format!("failed to archive {}", cli.output.display()))?;
            render_archive_failures(&summary, &sink);
            cli.format.emit(&summary)?;
        }
    }

    Ok(())
}
