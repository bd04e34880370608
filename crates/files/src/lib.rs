//! wordfarm artifact storage
//!
//! This crate owns the on-disk layout of generated word artifacts.
//!
//! ## Storage Layout
//!
//! Every word is stored under a two-level directory keyed by its first two
//! characters, with the full word as the file name:
//!
//! ```text
//! <output_root>/
//! └── a/            # first character
//!     └── p/        # second character
//!         └── apple.txt
//! ```
//!
//! Two distinct words with the same first two characters share a directory but never
//! a file.
//!
//! ## Example Usage
//!
//! ```no_run
//! use wordfarm_files::ArtifactStore;
//! use wordfarm_types::Word;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ArtifactStore::open(Path::new("output"))?;
//! let word = Word::parse("Apple")?;
//!
//! let mut buffer = Vec::new();
//! let path = store.write(&word, &mut buffer)?;
//! assert!(path.ends_with("a/p/apple.txt"));
//! # Ok(())
//! # }
//! ```

mod constants;
mod store;

pub use constants::{ARTIFACT_EXTENSION, ARTIFACT_REPETITIONS};
pub use store::{render_artifact, ArtifactStore};

/// Errors that can occur during artifact storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Output root exists but is not a directory, or cannot be created
    #[error("Invalid output root: {0}")]
    InvalidRootDirectory(String),

    /// Word cannot be mapped to a safe path inside the output root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
