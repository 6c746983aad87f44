use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{PapersetError, Result};
use crate::storage::tables::TABLE_FILES;

/// Copy the finished tables verbatim into `{releases_dir}/{YYYY-MM-DD}`.
///
/// An existing directory for the same date is reused and its tables overwritten.
pub fn stage_release(processed_dir: &Path, releases_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    for name in TABLE_FILES {
        if !processed_dir.join(name).is_file() {
            return Err(PapersetError::TableNotFound(
                processed_dir.join(name).display().to_string(),
            ));
        }
    }

    let target = releases_dir.join(date.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&target)?;
    for name in TABLE_FILES {
        fs::copy(processed_dir.join(name), target.join(name))?;
    }

    tracing::info!(release = %target.display(), "release staged");
    Ok(target)
}
