//! Run-timing ledger.
//!
//! One CSV row per run, `label,milliseconds`, appended to a ledger that starts with
//! `Version,DurationMilliseconds`.

use crate::constants::TIMINGS_HEADER;
use crate::{CoreError, CoreResult};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Appends a row for `label` to the ledger at `path`, writing the header first when the
/// ledger is new or empty.
///
/// # Errors
///
/// Returns `CoreError::Timing` if the ledger cannot be opened or written.
pub fn append_duration(path: &Path, label: &str, elapsed: Duration) -> CoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(CoreError::Timing)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(CoreError::Timing)?;
    let is_new = file.metadata().map_err(CoreError::Timing)?.len() == 0;

    let mut writer = BufWriter::new(file);
    if is_new {
        writeln!(writer, "{TIMINGS_HEADER}").map_err(CoreError::Timing)?;
    }
    writeln!(writer, "{}", format_row(label, elapsed)).map_err(CoreError::Timing)?;
    writer.flush().map_err(CoreError::Timing)?;

    tracing::debug!("recorded {} in {}", label, path.display());
    Ok(())
}

/// Whole milliseconds rendered with two decimals, e.g. `12.00`.
fn format_row(label: &str, elapsed: Duration) -> String {
    format!("{},{:.2}", label, elapsed.as_millis() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_row() {
        assert_eq!(
            format_row("parallel-parallel", Duration::from_micros(12_346)),
            "parallel-parallel,12.00"
        );
        assert_eq!(format_row("seq", Duration::ZERO), "seq,0.00");
    }

    #[test]
    fn test_header_written_once() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("execution_time.csv");

        append_duration(&path, "sequential-parallel", Duration::from_millis(5)).unwrap();
        append_duration(&path, "parallel-parallel", Duration::from_millis(7)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Version,DurationMilliseconds",
                "sequential-parallel,5.00",
                "parallel-parallel,7.00",
            ]
        );
    }

    #[test]
    fn test_ledger_path_is_directory() {
        let temp = TempDir::new().unwrap();
        let result = append_duration(temp.path(), "x", Duration::ZERO);
        assert!(matches!(result, Err(CoreError::Timing(_))));
    }
}
