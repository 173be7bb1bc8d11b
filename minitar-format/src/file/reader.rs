use std::fs::{self, File, OpenOptions};
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::{
    block::{self, Block, BLOCK_SIZE},
    entry::Entry,
    error::{Error, Result},
    fs::{apply_mode, restore_metadata},
    header::{is_zero_block, Header, HeaderError},
};

/// Counters reported after an extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files_extracted: u64,
    pub bytes_extracted: u64,
    /// Entries with a typeflag other than regular file.
    pub entries_skipped: u64,
}

/// Walks an archive header by header.
///
/// Navigation relies only on the `size` recorded in each header; the files
/// the archive was built from are never consulted.
#[derive(Debug)]
pub struct TarFileReader {
    pub(crate) file: BufReader<File>,
    pub(crate) path: PathBuf,
    pub(crate) len: u64,
    pub(crate) offset: u64,
    pub(crate) finished: bool,
}

impl TarFileReader {
    /// Opens an existing archive for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TarFileReader> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| Error::ArchiveNotFound {
                path: path.to_path_buf(),
                source,
            })?;
        let len = file
            .metadata()
            .map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        Ok(TarFileReader {
            file: BufReader::new(file),
            path: path.to_path_buf(),
            len,
            offset: 0,
            finished: false,
        })
    }

    /// Returns the next entry and moves past its payload.
    ///
    /// `Ok(None)` means the end-of-archive marker was reached.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        let entry = match self.next_header()? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let skipped =
            block::skip_payload(&mut self.file, entry.size()).map_err(|source| Error::Read {
                path: self.path.clone(),
                source,
            })?;
        self.offset += skipped;

        Ok(Some(entry))
    }

    /// Reads every entry up to the end-of-archive marker.
    ///
    /// A corrupt header anywhere fails the whole call; no partial list is
    /// returned.
    pub fn entries(mut self) -> Result<Vec<Entry>> {
        let mut entries = vec![];
        while let Some(entry) = self.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Member names in archive order, duplicates included.
    pub fn names(self) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| entry.header.name.as_str().to_string())
            .collect())
    }

    /// Extracts every regular file below `dest`, in archive order.
    ///
    /// A member that appears more than once is written each time, so the
    /// last copy wins.
    pub fn extract_all<P: AsRef<Path>>(mut self, dest: P) -> Result<ExtractStats> {
        let dest = dest.as_ref();
        let mut stats = ExtractStats::default();

        while let Some(entry) = self.next_header()? {
            if !entry.is_regular() {
                tracing::warn!(
                    name = %entry.name(),
                    typeflag = %(entry.header.entry_type.as_byte() as char),
                    "skipping unsupported entry"
                );
                let skipped = block::skip_payload(&mut self.file, entry.size()).map_err(
                    |source| Error::Read {
                        path: self.path.clone(),
                        source,
                    },
                )?;
                self.offset += skipped;
                stats.entries_skipped += 1;
                continue;
            }

            self.extract_entry(&entry, dest)?;
            stats.files_extracted += 1;
            stats.bytes_extracted += entry.size();
        }

        Ok(stats)
    }

    fn extract_entry(&mut self, entry: &Entry, dest: &Path) -> Result<()> {
        let header = &entry.header;
        let target = header
            .name
            .resolve(dest)
            .map_err(|source| Error::UnsafePath {
                name: header.name.to_string(),
                source,
            })?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::CreateFile {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Unlink first so a read-only copy from an earlier entry can be replaced
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(Error::CreateFile { path: target, source }),
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|source| Error::CreateFile {
                path: target.clone(),
                source,
            })?;

        let mut out = BufWriter::new(file);
        let copied = block::copy_payload(&mut self.file, &mut out, header.size).map_err(|source| {
            match source.kind() {
                io::ErrorKind::UnexpectedEof => Error::TruncatedArchive {
                    path: self.path.clone(),
                    offset: self.len,
                },
                _ => Error::Extract {
                    path: target.clone(),
                    source,
                },
            }
        })?;
        self.offset += copied;

        let file = out.into_inner().map_err(|e| Error::Extract {
            path: target.clone(),
            source: e.into_error(),
        })?;

        apply_mode(&target, header).map_err(|source| Error::Extract {
            path: target.clone(),
            source,
        })?;
        restore_metadata(&target, &file, header);

        tracing::info!(name = %header.name, size = header.size, "extracted");
        Ok(())
    }

    /// Reads and decodes the next header, leaving the cursor at its payload.
    fn next_header(&mut self) -> Result<Option<Entry>> {
        if self.finished {
            return Ok(None);
        }

        let offset = self.offset;
        let block = self.read_block()?;

        if is_zero_block(&block) {
            let next = self.read_block()?;
            if !is_zero_block(&next) {
                return Err(Error::MalformedHeader {
                    path: self.path.clone(),
                    offset,
                    source: HeaderError::Malformed("stray zero block before end of archive"),
                });
            }

            tracing::debug!(
                start = format_args!("{:#x}", offset),
                "reached end-of-archive marker"
            );
            self.finished = true;
            return Ok(None);
        }

        let header =
            Header::decode(&block).map_err(|e| Error::corrupt(self.path.clone(), offset, e))?;
        let entry = Entry { header, offset };

        if entry.next_offset() > self.len {
            return Err(Error::TruncatedArchive {
                path: self.path.clone(),
                offset: self.len,
            });
        }

        tracing::debug!(
            start = format_args!("{:#x}", offset),
            end = format_args!("{:#x}", entry.next_offset()),
            name = %entry.name(),
            size = entry.size(),
            "read header"
        );

        Ok(Some(entry))
    }

    /// Reads one block; running out of data before the marker is truncation.
    fn read_block(&mut self) -> Result<Block> {
        let block = block::read_block(&mut self.file).map_err(|source| match source.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedArchive {
                path: self.path.clone(),
                offset: self.offset,
            },
            _ => Error::Read {
                path: self.path.clone(),
                source,
            },
        })?;

        match block {
            Some(block) => {
                self.offset += BLOCK_SIZE as u64;
                Ok(block)
            }
            None => Err(Error::TruncatedArchive {
                path: self.path.clone(),
                offset: self.offset,
            }),
        }
    }
}
