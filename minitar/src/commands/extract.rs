use std::path::Path;

use crate::error::{Error, Result};
use crate::util::format_size;

pub fn run(archive: &Path, output: Option<&Path>) -> Result<()> {
    let output = output.unwrap_or_else(|| Path::new("."));

    let stats = minitar_format::extract_to(archive, output).map_err(|source| Error::Extract {
        path: archive.to_path_buf(),
        source,
    })?;

    if stats.entries_skipped > 0 {
        tracing::warn!(
            skipped = stats.entries_skipped,
            "some members were not regular files and were skipped"
        );
    }
    tracing::info!(
        files = stats.files_extracted,
        size = %format_size(stats.bytes_extracted),
        dest = %output.display(),
        "extracted archive"
    );
    Ok(())
}
