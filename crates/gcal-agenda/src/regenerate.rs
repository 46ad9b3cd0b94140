//! Monthly agenda file replacement.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use gcal_agenda_core::YearMonth;

/// Replaces the agenda file of every given month under `output_dir`.
///
/// Every existing file for the given months is removed before any file is
/// written, so a month never keeps entries from an earlier run. Returns the
/// written paths in input order.
pub fn regenerate(output_dir: &Path, months: &[(YearMonth, String)]) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    for (month, _) in months {
        let path = output_dir.join(month.file_name());
        match fs::remove_file(&path) {
            Ok(()) => info!("Removed existing file: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    let mut written = Vec::with_capacity(months.len());
    for (month, content) in months {
        let path = output_dir.join(month.file_name());
        fs::write(&path, content)?;
        info!("Generated: {}", path.display());
        written.push(path);
    }

    Ok(written)
}
