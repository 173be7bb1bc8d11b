use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::util::format_size;

pub fn run(archive: &Path, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        return Err(Error::NoFilesSpecified);
    }

    let len = minitar_format::append(archive, files).map_err(|source| Error::AppendArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    tracing::info!(
        archive = %archive.display(),
        files = files.len(),
        size = %format_size(len),
        "appended to archive"
    );
    Ok(())
}
