//! Per-directory zip archives with measured space savings.
//!
//! For every top-level directory `<root>/<name>` the archiver writes `<root>/<name>.zip`
//! containing every regular file beneath it. Entry names are relative to the output root
//! (`a/p/apple.txt`), so extracting into the root reconstructs the original tree.
//!
//! Builds run on the blocking pool, at most `archivers` at a time. The directory size is
//! measured before its archive is written. A failed build is logged, its partial archive is
//! removed, and the remaining directories carry on. Files the walk cannot read are left out
//! of the archive and counted in [`ArchiveEntry::skipped`].

use crate::accountant::{
    directory_size, top_level_directories, walk_files, FileSize, SkippedEntry,
};
use crate::constants::ARCHIVE_EXTENSION;
use crate::report::{format_archive_line, ReportSink};
use crate::{CoreError, CoreResult};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Space saved by compressing a directory.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Savings {
    /// `(original - compressed) / original * 100`; negative when the archive is larger.
    Percent(f64),
    /// The original size was zero, so no ratio exists.
    NotApplicable,
}

impl Savings {
    pub fn compute(original_bytes: u64, compressed_bytes: u64) -> Self {
        if original_bytes == 0 {
            return Savings::NotApplicable;
        }
        let original = original_bytes as f64;
        Savings::Percent((original - compressed_bytes as f64) / original * 100.0)
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Savings::Percent(p) => Some(*p),
            Savings::NotApplicable => None,
        }
    }
}

/// One successfully built archive.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArchiveEntry {
    pub directory: String,
    pub archive_path: PathBuf,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub savings: Savings,
    /// Entries left out because they could not be read.
    pub skipped: usize,
}

/// A directory whose archive could not be built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArchiveFailure {
    pub directory: String,
    pub error: String,
}

/// Outcome of archiving every top-level directory, both lists sorted by directory.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ArchiveSummary {
    pub entries: Vec<ArchiveEntry>,
    pub failures: Vec<ArchiveFailure>,
}

impl ArchiveSummary {
    pub fn get(&self, directory: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.directory == directory)
    }

    /// Unreadable entries left out across all archives.
    pub fn skipped_count(&self) -> usize {
        self.entries.iter().map(|e| e.skipped).sum()
    }
}

/// Path of the archive for top-level directory `name`.
pub fn archive_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{ARCHIVE_EXTENSION}"))
}

/// Archives `<root>/<name>` into `<root>/<name>.zip` and measures the savings.
///
/// # Errors
///
/// Returns `CoreError::Archive` or `CoreError::Zip` if the archive cannot be written or
/// stat'ed. Any partially written archive is removed.
pub fn archive_directory(root: &Path, name: &str) -> CoreResult<ArchiveEntry> {
    let source_dir = root.join(name);
    let destination = archive_path(root, name);

    // Size first: the archive must describe the same snapshot that was measured.
    let original_bytes = directory_size(&source_dir);

    let built = write_archive(walk_files(&source_dir), root, &destination);
    let skipped = match built {
        Ok(skipped) => skipped,
        Err(e) => {
            remove_partial(&destination);
            return Err(e);
        }
    };
    if skipped > 0 {
        tracing::warn!(
            "archive {} is missing {} unreadable entries",
            destination.display(),
            skipped
        );
    }

    let compressed_bytes = fs::metadata(&destination)
        .map_err(|source| CoreError::Archive {
            path: destination.clone(),
            source,
        })?
        .len();

    Ok(ArchiveEntry {
        directory: name.to_string(),
        archive_path: destination,
        original_bytes,
        compressed_bytes,
        savings: Savings::compute(original_bytes, compressed_bytes),
        skipped,
    })
}

fn remove_partial(destination: &Path) {
    if !destination.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(destination) {
        tracing::warn!(
            "failed to remove partial archive {}: {}",
            destination.display(),
            e
        );
    }
}

/// Archives every top-level directory under `root`, at most `archivers` at a time.
///
/// Each finished archive is reported to `sink` as it completes.
///
/// # Errors
///
/// Returns `CoreError::ListRoot` when the root cannot be listed, or a scheduling error if a
/// build task panics. Per-directory failures are collected in the summary.
pub async fn archive_all(
    root: &Path,
    archivers: usize,
    sink: Arc<ReportSink>,
) -> CoreResult<ArchiveSummary> {
    let directories = top_level_directories(root)?;
    let semaphore = Arc::new(Semaphore::new(archivers.max(1)));
    let mut builds = JoinSet::new();

    sink.line("\nZip Size Report:");

    for (name, _) in directories {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let root = root.to_path_buf();
        let sink = Arc::clone(&sink);

        builds.spawn_blocking(move || {
            let _permit = permit;
            let result = archive_directory(&root, &name);
            if let Ok(entry) = &result {
                sink.line(format_archive_line(entry));
            }
            (name, result)
        });
    }

    let mut summary = ArchiveSummary::default();
    while let Some(joined) = builds.join_next().await {
        let (directory, result) = joined?;
        match result {
            Ok(entry) => summary.entries.push(entry),
            Err(e) => {
                tracing::warn!("failed to archive {}: {}", directory, e);
                summary.failures.push(ArchiveFailure {
                    directory,
                    error: e.to_string(),
                });
            }
        }
    }

    summary.entries.sort_by(|a, b| a.directory.cmp(&b.directory));
    summary.failures.sort_by(|a, b| a.directory.cmp(&b.directory));

    tracing::info!(
        "archived {} directories under {} ({} failed, {} entries skipped)",
        summary.entries.len(),
        root.display(),
        summary.failures.len(),
        summary.skipped_count()
    );
    Ok(summary)
}

/// Writes every readable entry to a new archive at `destination` and returns how many
/// entries were skipped.
fn write_archive<I>(entries: I, root: &Path, destination: &Path) -> CoreResult<usize>
where
    I: IntoIterator<Item = Result<FileSize, SkippedEntry>>,
{
    let io_error = |source: io::Error| CoreError::Archive {
        path: destination.to_path_buf(),
        source,
    };

    let file = File::create(destination).map_err(io_error)?;
    let mut archive = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut skipped = 0;

    for entry in entries {
        let Ok(file) = entry else {
            skipped += 1;
            continue;
        };

        let name = entry_name(&file.path, root).ok_or_else(|| {
            io_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is outside {}", file.path.display(), root.display()),
            ))
        })?;

        archive.start_file(name, options)?;
        let mut reader = File::open(&file.path).map_err(io_error)?;
        io::copy(&mut reader, &mut archive).map_err(io_error)?;
    }

    let mut writer = archive.finish()?;
    writer.flush().map_err(io_error)?;
    Ok(skipped)
}

/// Root-relative entry name with `/` separators, e.g. `a/p/apple.txt`.
fn entry_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read_entry(archive: &Path, name: &str) -> String {
        let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_savings_compute() {
        assert_eq!(Savings::compute(1000, 250), Savings::Percent(75.0));
        assert_eq!(Savings::compute(0, 22), Savings::NotApplicable);
        assert_eq!(Savings::compute(100, 150).percent(), Some(-50.0));
    }

    #[test]
    fn test_archive_directory_roundtrip() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let apple = "apple\n".repeat(100);
        let apricot = "apricot\n".repeat(100);
        write_file(&root.join("a/p/apple.txt"), &apple);
        write_file(&root.join("a/p/apricot.txt"), &apricot);
        write_file(&root.join("a/n/ant.txt"), "ant\n");

        let entry = archive_directory(root, "a").unwrap();

        assert_eq!(entry.archive_path, root.join("a.zip"));
        assert_eq!(
            entry.original_bytes,
            (apple.len() + apricot.len() + 4) as u64
        );
        assert!(entry.compressed_bytes > 0);
        assert!(entry.savings.percent().unwrap() > 0.0);
        assert_eq!(entry.skipped, 0);

        let zip = zip::ZipArchive::new(File::open(root.join("a.zip")).unwrap()).unwrap();
        let mut names: Vec<&str> = zip.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["a/n/ant.txt", "a/p/apple.txt", "a/p/apricot.txt"]);
        assert_eq!(read_entry(&root.join("a.zip"), "a/p/apple.txt"), apple);
        assert_eq!(read_entry(&root.join("a.zip"), "a/n/ant.txt"), "ant\n");
    }

    #[test]
    fn test_archive_empty_directory_not_applicable() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("e/m")).unwrap();

        let entry = archive_directory(temp.path(), "e").unwrap();

        assert_eq!(entry.original_bytes, 0);
        assert_eq!(entry.savings, Savings::NotApplicable);
        assert!(temp.path().join("e.zip").is_file());
    }

    #[test]
    fn test_archive_failure_removes_partial_file() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("b/a/bat.txt"), "bat\n");
        // A directory where the archive file should be created.
        fs::create_dir_all(temp.path().join("b.zip")).unwrap();

        let result = archive_directory(temp.path(), "b");

        assert!(matches!(result, Err(CoreError::Archive { .. })));
        assert!(temp.path().join("b.zip").is_dir());
    }

    #[test]
    fn test_write_archive_counts_unreadable_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(&root.join("a/p/apple.txt"), "apple\n");
        let entries = vec![
            Err(SkippedEntry {
                path: root.join("a/n"),
                error: "Permission denied (os error 13)".into(),
            }),
            Ok(FileSize {
                path: root.join("a/p/apple.txt"),
                bytes: 6,
            }),
        ];
        let destination = root.join("a.zip");

        let skipped = write_archive(entries, root, &destination).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(read_entry(&destination, "a/p/apple.txt"), "apple\n");
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let root = Path::new("/out");
        assert_eq!(
            entry_name(Path::new("/out/a/p/apple.txt"), root),
            Some("a/p/apple.txt".to_string())
        );
        assert_eq!(entry_name(Path::new("/elsewhere/x.txt"), root), None);
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_archive_all_skips_failed_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for word in ["apple", "banana", "cherry", "date", "elder"] {
            let mut chars = word.chars();
            let (c0, c1) = (chars.next().unwrap(), chars.next().unwrap());
            write_file(
                &root.join(format!("{c0}/{c1}/{word}.txt")),
                &format!("{word}\n").repeat(100),
            );
        }
        // Dangling link: not listed as a directory, and the archive cannot be created.
        std::os::unix::fs::symlink(root.join("missing/c.zip"), root.join("c.zip")).unwrap();
        let sink = Arc::new(ReportSink::silent());

        let summary = archive_all(root, 2, Arc::clone(&sink)).await.unwrap();

        let archived: Vec<&str> = summary.entries.iter().map(|e| e.directory.as_str()).collect();
        assert_eq!(archived, vec!["a", "b", "d", "e"]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].directory, "c");

        let lines = sink.lines();
        assert_eq!(lines[0], "\nZip Size Report:");
        assert_eq!(lines.len(), 5);
        assert!(lines[1..].iter().all(|l| l.contains(" KB → ") && l.contains("Saved")));
    }

    #[tokio::test]
    async fn test_archive_all_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = archive_all(
            &temp.path().join("missing"),
            4,
            Arc::new(ReportSink::silent()),
        )
        .await;
        assert!(matches!(result, Err(CoreError::ListRoot { .. })));
    }
}
