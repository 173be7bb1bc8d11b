use std::fs::{File, OpenOptions};
use std::io::{prelude::*, BufWriter, SeekFrom};
use std::path::{Path, PathBuf};

use crate::{
    block::{self, BLOCK_SIZE, TERMINATOR_LEN},
    error::{Error, Result},
    fs::encode_path,
    header::Header,
};

/// Writes entries to an archive and closes it with the end-of-archive marker.
///
/// Only one writer may work on an archive at a time. Nothing is locked: two
/// processes appending to the same file will corrupt it.
#[derive(Debug)]
pub struct TarFileWriter {
    pub(crate) file: BufWriter<File>,
    pub(crate) path: PathBuf,
    pub(crate) canonical: PathBuf,
    pub(crate) offset: u64,
}

impl TarFileWriter {
    /// Creates a new, empty archive, truncating any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<TarFileWriter> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| Error::CreateFile {
                path: path.to_path_buf(),
                source,
            })?;

        Self::new(path, file, 0)
    }

    /// Opens an existing archive for appending.
    ///
    /// The end-of-archive marker is cut off the file right away and only
    /// written back by [`TarFileWriter::finish`]. If anything fails in between
    /// the archive is left without a marker.
    pub fn append<P: AsRef<Path>>(path: P) -> Result<TarFileWriter> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
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

        if len < TERMINATOR_LEN {
            return Err(Error::Truncation {
                path: path.to_path_buf(),
                len,
            });
        }

        let offset = len - TERMINATOR_LEN;
        if !ends_with_terminator(&mut file, offset).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })? {
            return Err(Error::MissingTerminator {
                path: path.to_path_buf(),
            });
        }

        file.set_len(offset).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        file.seek(SeekFrom::End(0)).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            start = format_args!("{:#x}", offset),
            "removed end-of-archive marker"
        );

        Self::new(path, file, offset)
    }

    fn new(path: &Path, file: File, offset: u64) -> Result<TarFileWriter> {
        let canonical = path.canonicalize().map_err(|source| Error::stat(path.to_path_buf(), source))?;

        Ok(TarFileWriter {
            file: BufWriter::new(file),
            path: path.to_path_buf(),
            canonical,
            offset,
        })
    }

    /// Number of bytes written so far, end-of-archive marker excluded.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Adds the regular file at `path` as a new entry.
    ///
    /// The member name is `path` as given. The payload is streamed in
    /// block-sized chunks, the last one zero-padded.
    pub fn insert<P: AsRef<Path>>(&mut self, path: P) -> Result<Header> {
        let path = path.as_ref();
        let (header, raw) = encode_path(path)?;

        if self.is_archive(path) {
            return Err(Error::ArchiveSelf {
                path: path.to_path_buf(),
            });
        }

        let mut source = File::open(path).map_err(|source| Error::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        let start = self.offset;
        self.file.write_all(&raw).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        self.offset += BLOCK_SIZE as u64;

        let padded = write_payload(&mut source, &mut self.file, path, header.size)?;
        self.offset += padded;

        tracing::debug!(
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", self.offset),
            name = %header.name,
            size = header.size,
            "wrote entry"
        );
        tracing::info!(name = %header.name, size = header.size, "added");

        Ok(header)
    }

    /// Writes the end-of-archive marker and flushes the archive.
    ///
    /// Returns the final archive length.
    pub fn finish(mut self) -> Result<u64> {
        block::write_terminator(&mut self.file).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        self.file.flush().map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;

        let len = self.offset + TERMINATOR_LEN;
        tracing::debug!(len, path = %self.path.display(), "finished archive");
        Ok(len)
    }

    fn is_archive(&self, path: &Path) -> bool {
        path.canonicalize()
            .map(|p| p == self.canonical)
            .unwrap_or(false)
    }
}

/// Copies exactly `size` bytes of `source` as a padded payload.
///
/// A source that runs out early fails with `FileChanged`, since the header
/// already promised `size` bytes. Returns the padded length written.
fn write_payload<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    path: &Path,
    size: u64,
) -> Result<u64> {
    let read = block::copy_padded(&mut (&mut *source).take(size), sink).map_err(|source| {
        Error::AddFile {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if read != size {
        return Err(Error::FileChanged {
            path: path.to_path_buf(),
            expected: size,
            actual: read,
        });
    }

    let mut extra = [0u8; 1];
    match source.read(&mut extra) {
        Ok(0) => {}
        Ok(_) => {
            tracing::warn!(path = %path.display(), "file grew while being archived; extra data ignored")
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not check for trailing data")
        }
    }

    Ok(block::padded_len(read))
}

fn ends_with_terminator(file: &mut File, offset: u64) -> std::io::Result<bool> {
    file.seek(SeekFrom::Start(offset))?;
    let mut tail = [0u8; TERMINATOR_LEN as usize];
    file.read_exact(&mut tail)?;

    Ok(tail.iter().all(|b| *b == 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn payload_is_padded() {
        let mut out = Vec::<u8>::new();
        let padded =
            write_payload(&mut Cursor::new(b"hi".to_vec()), &mut out, Path::new("a.txt"), 2).unwrap();
        assert_eq!(padded, 512);
        assert_eq!(out.len(), 512);
        assert_eq!(&out[..2], b"hi");
        assert!(out[2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn shrunk_source_is_file_changed() {
        let mut out = Vec::<u8>::new();
        match write_payload(&mut Cursor::new(vec![1u8; 300]), &mut out, Path::new("a.txt"), 700) {
            Err(Error::FileChanged {
                expected: 700,
                actual: 300,
                ..
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn grown_source_is_cut_at_size() {
        let mut out = Vec::<u8>::new();
        let padded =
            write_payload(&mut Cursor::new(vec![9u8; 600]), &mut out, Path::new("a.txt"), 512).unwrap();
        assert_eq!(padded, 512);
        assert_eq!(out, vec![9u8; 512]);
    }
}
