//! Directory size accounting.
//!
//! Sums the sizes of regular files beneath each top-level directory of the output root.
//! The result is a snapshot; it must only be taken once the writer pool for that root has
//! drained, and any later write invalidates it.
//!
//! Entries that cannot be read or stat'ed contribute zero bytes. They are logged at `warn`
//! and kept in [`DirectorySize::skipped`] so the report can summarize them.

use crate::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Size of one regular file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileSize {
    pub path: PathBuf,
    pub bytes: u64,
}

/// An entry the walk could not read or stat.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub error: String,
}

/// Recursive size of one top-level directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DirectorySize {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<FileSize>,
    pub total_bytes: u64,
    pub skipped: Vec<SkippedEntry>,
}

/// Sizes of every top-level directory under an output root, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SizeReport {
    pub directories: Vec<DirectorySize>,
}

impl SizeReport {
    pub fn total_bytes(&self) -> u64 {
        self.directories.iter().map(|d| d.total_bytes).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.directories.iter().map(|d| d.skipped.len()).sum()
    }

    pub fn get(&self, name: &str) -> Option<&DirectorySize> {
        self.directories.iter().find(|d| d.name == name)
    }
}

/// Lists the immediate subdirectories of `root` as `(name, path)`, sorted by name.
///
/// Regular files at the root (archives, ledgers) are ignored.
///
/// # Errors
///
/// Returns `CoreError::ListRoot` when the root itself cannot be read.
pub fn top_level_directories(root: &Path) -> CoreResult<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(root).map_err(|source| CoreError::ListRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let mut directories: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("skipping unreadable entry in {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();

    directories.sort();
    Ok(directories)
}

/// Walks the regular files beneath `dir` in file-name order.
///
/// Symlinks are not followed. Entries that fail to read or stat are yielded as
/// [`SkippedEntry`] and logged at `warn`.
pub(crate) fn walk_files(
    dir: &Path,
) -> impl Iterator<Item = Result<FileSize, SkippedEntry>> + '_ {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    return Some(Err(skipped(path, e.to_string())));
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            Some(match entry.metadata() {
                Ok(metadata) => Ok(FileSize {
                    bytes: metadata.len(),
                    path: entry.into_path(),
                }),
                Err(e) => Err(skipped(entry.into_path(), e.to_string())),
            })
        })
}

fn skipped(path: PathBuf, error: String) -> SkippedEntry {
    tracing::warn!("skipping {}: {}", path.display(), error);
    SkippedEntry { path, error }
}

/// Folds walked entries into a [`DirectorySize`].
fn tally<I>(name: &str, dir: &Path, entries: I) -> DirectorySize
where
    I: IntoIterator<Item = Result<FileSize, SkippedEntry>>,
{
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        match entry {
            Ok(file) => files.push(file),
            Err(entry) => skipped.push(entry),
        }
    }

    let total_bytes = files.iter().map(|f| f.bytes).sum();
    DirectorySize {
        name: name.to_string(),
        path: dir.to_path_buf(),
        files,
        total_bytes,
        skipped,
    }
}

/// Measures one directory, listing every regular file beneath it.
pub fn measure_directory(name: &str, dir: &Path) -> DirectorySize {
    tally(name, dir, walk_files(dir))
}

/// Total size in bytes of the regular files beneath `dir`.
pub fn directory_size(dir: &Path) -> u64 {
    walk_files(dir).filter_map(Result::ok).map(|f| f.bytes).sum()
}

/// Measures every top-level directory under `root`.
///
/// # Errors
///
/// Returns `CoreError::ListRoot` when the root cannot be read. Per-entry errors are not
/// fatal; they are collected per directory.
pub fn account(root: &Path) -> CoreResult<SizeReport> {
    let directories = top_level_directories(root)?
        .into_iter()
        .map(|(name, path)| measure_directory(&name, &path))
        .collect::<Vec<_>>();

    let report = SizeReport { directories };
    tracing::info!(
        "accounted {} top-level directories under {} ({} entries skipped)",
        report.directories.len(),
        root.display(),
        report.skipped_count()
    );
    Ok(report)
}
