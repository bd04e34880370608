//! # Wordfarm Core
//!
//! Core pipeline logic for wordfarm.
//!
//! This crate turns a word list into a sharded tree of artifact files and then reports on it:
//! - Ingestion of a line-oriented word source, sequential or through a normalizer pool
//! - Artifact materialization through a bounded writer pool
//! - Per-directory size accounting and zip archival with space savings
//! - Word statistics, text export and a run-timing ledger
//!
//! **No CLI concerns**: argument parsing and environment handling belong in the binaries,
//! which resolve a [`PipelineConfig`] once at startup and hand it to [`Pipeline::new`].

pub mod accountant;
pub mod archiver;
mod buffer;
pub mod config;
pub mod constants;
mod error;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod timing;
pub mod writer;

pub use config::{EnvValues, PipelineConfig, PipelineTuning, Strategy};
pub use error::{CoreError, CoreResult};
pub use ingest::WordCollection;
pub use pipeline::Pipeline;
pub use report::{ReportSink, RunReport};

pub use wordfarm_types::{capitalize_all, Word, WordStats};
