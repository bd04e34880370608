//! Output-root scoped artifact store
//!
//! [`ArtifactStore`] maps words to their artifact paths and performs the per-word
//! directory creation and file write used by the writer pool.
//!
//! # Concurrency
//!
//! The store holds no mutable state and is `Send + Sync`; any number of workers may
//! share one instance. Parent directories are created with mkdir-if-absent semantics,
//! so many workers racing to create the same shard directory all succeed. Writes to
//! the same artifact path replace the file with identical content.
//!
//! # Path Safety
//!
//! [`ArtifactStore::artifact_path`] is total for every [`Word`]. Words that would
//! escape their shard directory (path separators, NUL, or a `.` shard key) are
//! rejected by [`ArtifactStore::write`] with [`FilesError::InvalidPath`] rather than
//! written somewhere unexpected.

use crate::{FilesError, ARTIFACT_EXTENSION, ARTIFACT_REPETITIONS};
use std::fs;
use std::path::{Path, PathBuf};
use wordfarm_types::Word;

/// Store bound to a single output root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Canonicalised output root
    root_directory: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating the output root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - The root cannot be created
    /// - The root exists but is not a directory
    /// - Path canonicalisation fails
    /// - A file cannot be created inside the root
    pub fn open(root_directory: &Path) -> Result<Self, FilesError> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        fs::create_dir_all(root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        // Writability check; the temporary file is removed on drop.
        tempfile::NamedTempFile::new_in(&root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot write to {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Returns the canonicalised output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root_directory
    }

    /// Computes the absolute artifact path: `<root>/<c0>/<c1>/<word>.txt`.
    #[must_use]
    pub fn artifact_path(&self, word: &Word) -> PathBuf {
        self.root_directory.join(Self::relative_path(word))
    }

    /// Computes the root-relative artifact path: `<c0>/<c1>/<word>.txt`.
    #[must_use]
    pub fn relative_path(word: &Word) -> PathBuf {
        let (first, second) = word.shard_keys();
        let mut path = PathBuf::new();
        path.push(first.to_string());
        path.push(second.to_string());
        path.push(format!("{}.{}", word.as_str(), ARTIFACT_EXTENSION));
        path
    }

    /// Writes the artifact for `word`, creating its shard directories as needed.
    ///
    /// `buffer` is scratch space; it is cleared and refilled with the artifact content
    /// so callers can reuse one allocation across many words.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The word cannot be mapped to a safe path
    /// - Shard directory creation fails (I/O)
    /// - The file write fails (I/O)
    pub fn write(&self, word: &Word, buffer: &mut Vec<u8>) -> Result<PathBuf, FilesError> {
        validate_word_for_path(word)?;

        let artifact_path = self.artifact_path(word);

        if let Some(parent) = artifact_path.parent() {
            // create_dir_all tolerates another worker creating the same directory.
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create shard directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        render_artifact(word, buffer);

        fs::write(&artifact_path, &buffer[..]).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write artifact {}: {}", artifact_path.display(), e),
            ))
        })?;

        tracing::trace!("wrote artifact {}", artifact_path.display());

        Ok(artifact_path)
    }
}

/// Fills `buffer` with the artifact content for `word`.
///
/// The buffer is cleared first; the result is the word followed by `\n`, repeated
/// [`ARTIFACT_REPETITIONS`] times.
pub fn render_artifact(word: &Word, buffer: &mut Vec<u8>) {
    let line = word.as_str().as_bytes();
    buffer.clear();
    buffer.reserve((line.len() + 1) * ARTIFACT_REPETITIONS);
    for _ in 0..ARTIFACT_REPETITIONS {
        buffer.extend_from_slice(line);
        buffer.push(b'\n');
    }
}

fn validate_word_for_path(word: &Word) -> Result<(), FilesError> {
    let text = word.as_str();
    if text.contains(['/', '\\', '\0']) {
        return Err(FilesError::InvalidPath(format!(
            "word '{}' contains a path separator",
            text.escape_default()
        )));
    }

    let (first, second) = word.shard_keys();
    if first == '.' || second == '.' {
        return Err(FilesError::InvalidPath(format!(
            "word '{}' has a '.' shard key",
            text
        )));
    }

    Ok(())
}
