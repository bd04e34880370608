//! End-to-end pipeline: ingest, write, account, archive.
//!
//! Stages run strictly in order and each one ends at a completion barrier, so accounting
//! only ever observes a fully drained writer pool and archiving only starts once sizes
//! have been reported.

use crate::accountant::{account, SizeReport};
use crate::archiver::{archive_all, ArchiveSummary};
use crate::config::PipelineConfig;
use crate::export::write_word_list;
use crate::ingest::{ingest_file, WordCollection};
use crate::report::{
    render_archive_failures, render_size_report, render_stats, render_write_summary,
    ReportSink, RunReport,
};
use crate::timing::append_duration;
use crate::writer::{write_artifacts, WriteSummary};
use crate::CoreResult;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use wordfarm_files::ArtifactStore;
use wordfarm_types::{capitalize_all, Word, WordStats};

/// A configured pipeline. Cheap to construct; no I/O happens until a stage is run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    sink: Arc<ReportSink>,
}

impl Pipeline {
    /// Creates a pipeline that prints its report to stdout.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if the configuration does not validate.
    pub fn new(config: PipelineConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink: Arc::new(ReportSink::stdout()),
        })
    }

    pub fn with_sink(mut self, sink: Arc<ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &Arc<ReportSink> {
        &self.sink
    }

    /// Reads the input, sorting it when stable order is requested and the strategy did not
    /// already produce one.
    pub async fn ingest(&self) -> CoreResult<WordCollection> {
        let collection = ingest_file(
            self.config.input_path(),
            self.config.ingest_strategy(),
            self.config.tuning().normalizers,
        )
        .await?;

        if self.config.stable_order() && !collection.is_ordered() {
            tracing::debug!(
                "sorting {} {} words for stable order",
                collection.len(),
                collection.strategy()
            );
            return Ok(collection.sorted());
        }
        Ok(collection)
    }

    /// Writes one artifact per word under the output root and reports the outcome.
    pub async fn write(&self, words: &[Word]) -> CoreResult<WriteSummary> {
        let store = Arc::new(ArtifactStore::open(self.config.output_root())?);
        let summary = write_artifacts(
            store,
            words,
            self.config.write_strategy(),
            self.config.tuning().writers,
        )
        .await?;
        render_write_summary(&summary, &self.sink);
        Ok(summary)
    }

    /// Measures every top-level directory and prints the size report.
    pub async fn sizes(&self) -> CoreResult<SizeReport> {
        let root = self.config.output_root().to_path_buf();
        let report = tokio::task::spawn_blocking(move || account(&root)).await??;
        render_size_report(&report, &self.sink);
        Ok(report)
    }

    /// Archives every top-level directory and prints one line per archive.
    pub async fn archive(&self) -> CoreResult<ArchiveSummary> {
        let summary = archive_all(
            self.config.output_root(),
            self.config.tuning().archivers,
            Arc::clone(&self.sink),
        )
        .await?;
        render_archive_failures(&summary, &self.sink);
        Ok(summary)
    }

    /// Runs every stage and records the run in the timing ledger.
    ///
    /// # Errors
    ///
    /// Fails on setup errors (unreadable input, unusable output root) and when a worker
    /// stage itself breaks. Per-word and per-directory failures are reported, not returned.
    /// A timing ledger that cannot be written is logged and ignored.
    pub async fn run(&self) -> CoreResult<RunReport> {
        let started_at = Utc::now();
        let started = Instant::now();

        // Fail on an unusable root before reading any input.
        ArtifactStore::open(self.config.output_root())?;

        let collection = self.ingest().await?;
        let ordered = collection.is_ordered();
        let words = collection.into_words();

        let stats = WordStats::analyze(&words);
        render_stats(&stats, &self.sink);

        if let Some(path) = self.config.export_path() {
            write_word_list(&capitalize_all(&words), path)?;
        }

        let writes = self.write(&words).await?;
        let sizes = self.sizes().await?;
        let archives = self.archive().await?;

        let elapsed = started.elapsed();
        if let Some(path) = self.config.timings_path() {
            if let Err(e) = append_duration(path, &self.config.run_label(), elapsed) {
                tracing::warn!("failed to record run timing: {}", e);
            }
        }

        tracing::info!(
            "pipeline {} finished in {:.2?}",
            self.config.run_label(),
            elapsed
        );

        Ok(RunReport {
            started_at,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            ingest_strategy: self.config.ingest_strategy(),
            write_strategy: self.config.write_strategy(),
            ordered,
            stats,
            writes,
            sizes,
            archives,
        })
    }
}
