//! Human-readable and structured run reports.
//!
//! Text lines keep the historical format, including kilobyte truncation by integer
//! division:
//!
//! ```text
//! [output/a/]
//!         0 KB  output/a/p/apple.txt
//! ==> Total size: 0 KB
//! [a]        0 KB →        0 KB (Saved 83.3%)
//! ```

use crate::accountant::SizeReport;
use crate::archiver::{ArchiveEntry, ArchiveSummary};
use crate::config::Strategy;
use crate::writer::WriteSummary;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use wordfarm_types::WordStats;

/// Shared output for report lines written by concurrent tasks.
///
/// Every line is recorded, and optionally echoed to stdout, while holding one lock, so
/// lines from different tasks never interleave.
#[derive(Debug, Default)]
pub struct ReportSink {
    echo: bool,
    lines: Mutex<Vec<String>>,
}

impl ReportSink {
    /// A sink that prints every line to stdout as well as recording it.
    pub fn stdout() -> Self {
        Self {
            echo: true,
            lines: Mutex::default(),
        }
    }

    /// A sink that only records lines.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if self.echo {
            println!("{line}");
        }
        lines.push(line);
    }

    /// Snapshot of every line recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn kilobytes(bytes: u64) -> u64 {
    bytes / 1024
}

pub fn format_folder_header(dir: &Path) -> String {
    format!("\n[{}/]", dir.display())
}

pub fn format_file_line(bytes: u64, path: &Path) -> String {
    format!("  {:>8} KB  {}", kilobytes(bytes), path.display())
}

pub fn format_total_line(bytes: u64) -> String {
    format!("==> Total size: {} KB", kilobytes(bytes))
}

pub fn format_archive_line(entry: &ArchiveEntry) -> String {
    let saved = match entry.savings.percent() {
        Some(percent) => format!("{percent:.1}%"),
        None => "n/a".to_string(),
    };
    format!(
        "[{}] {:>8} KB → {:>8} KB (Saved {})",
        entry.directory,
        kilobytes(entry.original_bytes),
        kilobytes(entry.compressed_bytes),
        saved
    )
}

/// Writes the per-directory size listing to `sink`, followed by a summary that is always
/// printed, even when nothing was skipped.
pub fn render_size_report(report: &SizeReport, sink: &ReportSink) {
    sink.line("\nFolder Size Report (Level 1):");
    for directory in &report.directories {
        sink.line(format_folder_header(&directory.path));
        for file in &directory.files {
            sink.line(format_file_line(file.bytes, &file.path));
        }
        sink.line(format_total_line(directory.total_bytes));
    }

    sink.line(format!(
        "\nDirectories measured: {} ({} KB, {} entries skipped)",
        report.directories.len(),
        kilobytes(report.total_bytes()),
        report.skipped_count()
    ));
    for skipped in report.directories.iter().flat_map(|d| &d.skipped) {
        sink.line(format!(
            "  SKIPPED {}: {}",
            skipped.path.display(),
            skipped.error
        ));
    }
}

/// Writes word statistics to `sink`.
pub fn render_stats(stats: &WordStats, sink: &ReportSink) {
    sink.line(format!("\nWord statistics ({} words):", stats.total));
    for line in stats.to_string().lines() {
        sink.line(line);
    }
}

/// Writes the writer pool failure summary to `sink`. Always prints a line, even when
/// nothing failed.
pub fn render_write_summary(summary: &WriteSummary, sink: &ReportSink) {
    sink.line(format!(
        "\nArtifacts written: {} of {} ({} failed)",
        summary.written,
        summary.attempted,
        summary.failures.len()
    ));
    for failure in &summary.failures {
        sink.line(format!(
            "  FAILED {} -> {}: {}",
            failure.word,
            failure.path.display(),
            failure.error
        ));
    }
}

/// Writes the archive failure summary to `sink`.
pub fn render_archive_failures(summary: &ArchiveSummary, sink: &ReportSink) {
    sink.line(format!(
        "Archives built: {} ({} failed, {} entries skipped)",
        summary.entries.len(),
        summary.failures.len(),
        summary.skipped_count()
    ));
    for failure in &summary.failures {
        sink.line(format!("  FAILED [{}]: {}", failure.directory, failure.error));
    }
    for entry in summary.entries.iter().filter(|e| e.skipped > 0) {
        sink.line(format!(
            "  INCOMPLETE [{}]: {} unreadable entries left out",
            entry.directory, entry.skipped
        ));
    }
}

/// Structured record of a full pipeline run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub ingest_strategy: Strategy,
    pub write_strategy: Strategy,
    pub ordered: bool,
    pub stats: WordStats,
    pub writes: WriteSummary,
    pub sizes: SizeReport,
    pub archives: ArchiveSummary,
}

impl RunReport {
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(CoreError::Serialization)
    }

    pub fn to_yaml(&self) -> CoreResult<String> {
        serde_yaml::to_string(self).map_err(CoreError::YamlSerialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accountant::{DirectorySize, FileSize, SkippedEntry};
    use crate::archiver::Savings;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn entry(original: u64, compressed: u64) -> ArchiveEntry {
        ArchiveEntry {
            directory: "a".into(),
            archive_path: PathBuf::from("output/a.zip"),
            original_bytes: original,
            compressed_bytes: compressed,
            savings: Savings::compute(original, compressed),
            skipped: 0,
        }
    }

    #[test]
    fn test_kilobytes_truncate() {
        assert_eq!(kilobytes(1023), 0);
        assert_eq!(kilobytes(1024), 1);
        assert_eq!(kilobytes(4095), 3);
    }

    #[test]
    fn test_file_and_total_lines() {
        assert_eq!(
            format_file_line(2048, Path::new("output/a/p/apple.txt")),
            "         2 KB  output/a/p/apple.txt"
        );
        assert_eq!(format_total_line(5000), "==> Total size: 4 KB");
        assert_eq!(format_folder_header(Path::new("output/a")), "\n[output/a/]");
    }

    #[test]
    fn test_archive_line_percent() {
        assert_eq!(
            format_archive_line(&entry(10240, 2048)),
            "[a]       10 KB →        2 KB (Saved 80.0%)"
        );
    }

    #[test]
    fn test_archive_line_not_applicable() {
        assert_eq!(
            format_archive_line(&entry(0, 22)),
            "[a]        0 KB →        0 KB (Saved n/a)"
        );
    }

    #[test]
    fn test_render_size_report() {
        let sink = ReportSink::silent();
        let report = SizeReport {
            directories: vec![DirectorySize {
                name: "a".into(),
                path: PathBuf::from("out/a"),
                files: vec![FileSize {
                    path: PathBuf::from("out/a/p/apple.txt"),
                    bytes: 600,
                }],
                total_bytes: 600,
                skipped: vec![],
            }],
        };

        render_size_report(&report, &sink);

        let lines = sink.lines();
        assert_eq!(lines[1], "\n[out/a/]");
        assert_eq!(lines[2], "         0 KB  out/a/p/apple.txt");
        assert_eq!(lines[3], "==> Total size: 0 KB");
        assert_eq!(lines[4], "\nDirectories measured: 1 (0 KB, 0 entries skipped)");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_size_report_lists_skipped_entries() {
        let sink = ReportSink::silent();
        let report = SizeReport {
            directories: vec![DirectorySize {
                name: "b".into(),
                path: PathBuf::from("out/b"),
                files: vec![],
                total_bytes: 0,
                skipped: vec![SkippedEntry {
                    path: PathBuf::from("out/b/x"),
                    error: "Permission denied (os error 13)".into(),
                }],
            }],
        };

        render_size_report(&report, &sink);

        let lines = sink.lines();
        assert_eq!(lines[3], "\nDirectories measured: 1 (0 KB, 1 entries skipped)");
        assert_eq!(lines[4], "  SKIPPED out/b/x: Permission denied (os error 13)");
    }

    #[test]
    fn test_archive_summary_reports_incomplete_archives() {
        let sink = ReportSink::silent();
        let mut partial = entry(2048, 1024);
        partial.skipped = 2;
        let summary = ArchiveSummary {
            entries: vec![partial],
            failures: vec![],
        };

        render_archive_failures(&summary, &sink);

        assert_eq!(
            sink.lines(),
            vec![
                "Archives built: 1 (0 failed, 2 entries skipped)",
                "  INCOMPLETE [a]: 2 unreadable entries left out",
            ]
        );
    }

    #[test]
    fn test_write_summary_always_reported() {
        let sink = ReportSink::silent();
        render_write_summary(&WriteSummary::default(), &sink);
        assert_eq!(sink.lines(), vec!["\nArtifacts written: 0 of 0 (0 failed)"]);
    }

    #[test]
    fn test_sink_lines_do_not_interleave() {
        let sink = Arc::new(ReportSink::silent());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.line(format!("task {t} line {i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|l| l.starts_with("task ")));
    }
}
