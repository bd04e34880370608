//! Constants used throughout the wordfarm core crate.
//!
//! This module contains path, filename and tuning constants to ensure
//! consistency across the codebase and make maintenance easier.

pub use wordfarm_files::{ARTIFACT_EXTENSION, ARTIFACT_REPETITIONS};

/// Default output root when no explicit directory is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extension of the per-directory archives written next to each top-level directory.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Default number of concurrent artifact writers.
pub const DEFAULT_WRITERS: usize = 16;

/// Default number of concurrent archive builds.
pub const DEFAULT_ARCHIVERS: usize = 4;

/// Normalizer count used when the available parallelism cannot be queried.
pub const FALLBACK_NORMALIZERS: usize = 4;

/// Filename for the run-timing ledger inside the output root.
pub const TIMINGS_FILENAME: &str = "execution_time.csv";

/// Header row of the run-timing ledger.
pub const TIMINGS_HEADER: &str = "Version,DurationMilliseconds";

/// Idle scratch buffers kept by the writer pool per worker.
pub const IDLE_BUFFERS_PER_WORKER: usize = 2;
