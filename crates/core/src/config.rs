//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the pipeline. The core never reads process-wide environment variables itself;
//! binaries collect raw values into [`EnvValues`] and resolve them with
//! [`PipelineConfig::from_env_values`].

use crate::constants::{
    DEFAULT_ARCHIVERS, DEFAULT_OUTPUT_DIR, DEFAULT_WRITERS, FALLBACK_NORMALIZERS,
    TIMINGS_FILENAME,
};
use crate::{CoreError, CoreResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How a stage schedules its work.
///
/// `Sequential` preserves input order. `Parallel` trades determinism for throughput: the
/// order in which words come out of parallel ingestion depends on scheduling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Sequential,
    Parallel,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "sequence" | "seq" => Ok(Strategy::Sequential),
            "parallel" | "par" => Ok(Strategy::Parallel),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown strategy '{other}' (expected sequential or parallel)"
            ))),
        }
    }
}

/// Concurrency limits for each worker stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PipelineTuning {
    /// Normalizer tasks used by parallel ingestion.
    pub normalizers: usize,
    /// Artifact writer tasks used by the parallel writer pool.
    pub writers: usize,
    /// Simultaneous archive builds.
    pub archivers: usize,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        let normalizers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_NORMALIZERS);

        Self {
            normalizers,
            writers: DEFAULT_WRITERS,
            archivers: DEFAULT_ARCHIVERS,
        }
    }
}

impl PipelineTuning {
    /// Rejects zero limits; a pool without workers would never drain.
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("normalizers", self.normalizers),
            ("writers", self.writers),
            ("archivers", self.archivers),
        ] {
            if value == 0 {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

/// Pipeline configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    input_path: PathBuf,
    output_root: PathBuf,
    ingest_strategy: Strategy,
    write_strategy: Strategy,
    tuning: PipelineTuning,
    stable_order: bool,
    export_path: Option<PathBuf>,
    timings_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Create a new `PipelineConfig` with sequential ingestion, parallel writes and default
    /// tuning.
    pub fn new(input_path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_root: output_root.into(),
            ingest_strategy: Strategy::Sequential,
            write_strategy: Strategy::Parallel,
            tuning: PipelineTuning::default(),
            stable_order: true,
            export_path: None,
            timings_path: None,
        }
    }

    pub fn with_ingest_strategy(mut self, strategy: Strategy) -> Self {
        self.ingest_strategy = strategy;
        self
    }

    pub fn with_write_strategy(mut self, strategy: Strategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    pub fn with_tuning(mut self, tuning: PipelineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// When set, an unordered (parallel) collection is sorted before statistics, export and
    /// writing so reports are reproducible.
    pub fn with_stable_order(mut self, stable_order: bool) -> Self {
        self.stable_order = stable_order;
        self
    }

    pub fn with_export_path(mut self, path: Option<PathBuf>) -> Self {
        self.export_path = path;
        self
    }

    pub fn with_timings_path(mut self, path: Option<PathBuf>) -> Self {
        self.timings_path = path;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("input path cannot be empty".into()));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig(
                "output root cannot be empty".into(),
            ));
        }
        self.tuning.validate()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn ingest_strategy(&self) -> Strategy {
        self.ingest_strategy
    }

    pub fn write_strategy(&self) -> Strategy {
        self.write_strategy
    }

    pub fn tuning(&self) -> PipelineTuning {
        self.tuning
    }

    pub fn stable_order(&self) -> bool {
        self.stable_order
    }

    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }

    pub fn timings_path(&self) -> Option<&Path> {
        self.timings_path.as_deref()
    }

    /// Label recorded in the timing ledger, e.g. `sequential-parallel`.
    pub fn run_label(&self) -> String {
        format!("{}-{}", self.ingest_strategy, self.write_strategy)
    }

    /// Resolve configuration from raw environment values without reading the environment.
    ///
    /// Missing or blank values fall back to defaults. `strategy` applies to both ingestion and
    /// writing.
    pub fn from_env_values(values: EnvValues) -> CoreResult<Self> {
        let input = non_blank(values.input).ok_or_else(|| {
            CoreError::InvalidConfig("WORDFARM_INPUT must name a word list file".into())
        })?;
        let output_root =
            PathBuf::from(non_blank(values.output_dir).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into()));

        let strategy = non_blank(values.strategy)
            .map(|s| s.parse::<Strategy>())
            .transpose()?;

        let defaults = PipelineTuning::default();
        let tuning = PipelineTuning {
            normalizers: parse_limit("WORDFARM_NORMALIZERS", values.normalizers)?
                .unwrap_or(defaults.normalizers),
            writers: parse_limit("WORDFARM_WRITERS", values.writers)?.unwrap_or(defaults.writers),
            archivers: parse_limit("WORDFARM_ARCHIVERS", values.archivers)?
                .unwrap_or(defaults.archivers),
        };

        let mut config = Self::new(input, output_root.clone())
            .with_tuning(tuning)
            .with_timings_path(Some(output_root.join(TIMINGS_FILENAME)))
            .with_export_path(non_blank(values.export_path).map(PathBuf::from));

        if let Some(strategy) = strategy {
            config = config
                .with_ingest_strategy(strategy)
                .with_write_strategy(strategy);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Raw, unparsed configuration values as read from the environment.
#[derive(Clone, Debug, Default)]
pub struct EnvValues {
    pub input: Option<String>,
    pub output_dir: Option<String>,
    pub strategy: Option<String>,
    pub normalizers: Option<String>,
    pub writers: Option<String>,
    pub archivers: Option<String>,
    pub export_path: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_limit(name: &str, value: Option<String>) -> CoreResult<Option<usize>> {
    non_blank(value)
        .map(|v| {
            v.parse::<usize>().map_err(|e| {
                CoreError::InvalidConfig(format!("{name} must be a positive integer: {e}"))
            })
        })
        .transpose()
}
