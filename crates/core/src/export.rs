//! Plain-text export of the final word list.

use crate::{CoreError, CoreResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `words` to `path`, one per line. Parent directories are created as needed and an
/// existing file is replaced.
///
/// # Errors
///
/// Returns `CoreError::Export` if the file cannot be created or written.
pub fn write_word_list<S: AsRef<str>>(words: &[S], path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(CoreError::Export)?;
    }

    let file = File::create(path).map_err(CoreError::Export)?;
    let mut writer = BufWriter::new(file);
    for word in words {
        writeln!(writer, "{}", word.as_ref()).map_err(CoreError::Export)?;
    }
    writer.flush().map_err(CoreError::Export)?;

    tracing::info!("exported {} words to {}", words.len(), path.display());
    Ok(())
}
