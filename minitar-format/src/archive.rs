//! The archive operations: create, append, update, list and extract.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    file::{ExtractStats, TarFileReader, TarFileWriter},
    path::TarPath,
};

/// What [`update`] did with each requested file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Files that had no entry in the archive yet.
    pub added: Vec<TarPath>,
    /// Files that already had an entry; a newer copy now follows it.
    pub replaced: Vec<TarPath>,
}

/// Writes a new archive at `archive` holding `files` in order.
///
/// An existing file at `archive` is truncated first. On failure the archive
/// is left incomplete. Returns the archive length.
pub fn create<P, I, Q>(archive: P, files: I) -> Result<u64>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Q>,
    Q: AsRef<Path>,
{
    let mut writer = TarFileWriter::create(archive)?;
    for file in files {
        writer.insert(file)?;
    }
    writer.finish()
}

/// Adds `files` after the last entry of an existing archive.
///
/// Existing entries are left untouched, even when a name repeats. On failure
/// the archive may be left without its end-of-archive marker. Returns the
/// archive length.
pub fn append<P, I, Q>(archive: P, files: I) -> Result<u64>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Q>,
    Q: AsRef<Path>,
{
    let mut writer = TarFileWriter::append(archive)?;
    for file in files {
        writer.insert(file)?;
    }
    writer.finish()
}

/// Brings the archive up to date with `files`.
///
/// Every file is appended; one whose name is already present gets a second,
/// later entry which wins on extraction. Nothing is ever removed, so the
/// archive only grows.
pub fn update<P, I, Q>(archive: P, files: I) -> Result<UpdateSummary>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Q>,
    Q: AsRef<Path>,
{
    let archive = archive.as_ref();
    let files: Vec<PathBuf> = files.into_iter().map(|f| f.as_ref().to_path_buf()).collect();
    let mut present: HashSet<String> = list(archive)?.into_iter().collect();

    let mut summary = UpdateSummary::default();
    for file in files.iter() {
        let name = TarPath::new(file).map_err(|source| Error::InvalidPath {
            path: file.clone(),
            source,
        })?;

        // A name requested twice replaces its own first copy
        if present.insert(name.as_str().to_string()) {
            tracing::info!(%name, "adding");
            summary.added.push(name);
        } else {
            tracing::info!(%name, "replacing");
            summary.replaced.push(name);
        }
    }

    append(archive, &files)?;
    Ok(summary)
}

/// Member names in archive order.
pub fn list<P: AsRef<Path>>(archive: P) -> Result<Vec<String>> {
    TarFileReader::open(archive)?.names()
}

/// Extracts every regular file into the current directory.
pub fn extract<P: AsRef<Path>>(archive: P) -> Result<ExtractStats> {
    extract_to(archive, ".")
}

/// Extracts every regular file below `dest`.
pub fn extract_to<P: AsRef<Path>, D: AsRef<Path>>(archive: P, dest: D) -> Result<ExtractStats> {
    TarFileReader::open(archive)?.extract_all(dest)
}
