use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub fn run(archive: &Path, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        return Err(Error::NoFilesSpecified);
    }

    let summary = minitar_format::update(archive, files).map_err(|source| Error::UpdateArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    tracing::info!(
        archive = %archive.display(),
        added = summary.added.len(),
        replaced = summary.replaced.len(),
        "updated archive"
    );
    Ok(())
}
