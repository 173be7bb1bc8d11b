use std::path::PathBuf;

use crate::header::HeaderError;
use crate::path::IntoTarPathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No such file `{}`", .path.display())]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot stat file `{}`", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot look up owner name of `{}` (uid {uid})", .path.display())]
    OwnerLookup { path: PathBuf, uid: u32 },

    #[error("Cannot look up group name of `{}` (gid {gid})", .path.display())]
    GroupLookup { path: PathBuf, gid: u32 },

    #[error("Cannot handle path `{}`", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: IntoTarPathError,
    },

    #[error("Cannot encode header for `{}`", .path.display())]
    EncodeHeader {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },

    #[error("Not a regular file `{}`", .path.display())]
    NotRegularFile { path: PathBuf },

    #[error("Cannot add file `{}` to archive", .path.display())]
    AddFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to add archive `{}` to itself", .path.display())]
    ArchiveSelf { path: PathBuf },

    #[error("Cannot open archive `{}`", .path.display())]
    ArchiveNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive `{}` is {len} bytes, too small to hold an end-of-archive marker", .path.display())]
    Truncation { path: PathBuf, len: u64 },

    #[error("Archive `{}` does not end with an end-of-archive marker", .path.display())]
    MissingTerminator { path: PathBuf },

    #[error("Cannot write to `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read from `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive `{}` ends unexpectedly at offset {offset:#x}", .path.display())]
    TruncatedArchive { path: PathBuf, offset: u64 },

    #[error(
        "Header checksum mismatch in `{}` at offset {offset:#x} (stored {stored:#o}, computed {computed:#o})",
        .path.display()
    )]
    ChecksumMismatch {
        path: PathBuf,
        offset: u64,
        stored: u32,
        computed: u32,
    },

    #[error("Malformed header in `{}` at offset {offset:#x}", .path.display())]
    MalformedHeader {
        path: PathBuf,
        offset: u64,
        #[source]
        source: HeaderError,
    },

    #[error(
        "File `{}` changed while being archived (expected {expected} bytes, read {actual})",
        .path.display()
    )]
    FileChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create file `{}`", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract `{}`", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to extract `{name}`")]
    UnsafePath {
        name: String,
        #[source]
        source: IntoTarPathError,
    },
}

impl Error {
    /// Lifts a header decoding failure into an archive error at `offset`.
    pub(crate) fn corrupt(path: PathBuf, offset: u64, source: HeaderError) -> Error {
        match source {
            HeaderError::ChecksumMismatch { stored, computed } => Error::ChecksumMismatch {
                path,
                offset,
                stored,
                computed,
            },
            source => Error::MalformedHeader {
                path,
                offset,
                source,
            },
        }
    }

    /// Maps a failed `stat` to `PathNotFound` or `Stat`.
    pub(crate) fn stat(path: PathBuf, source: std::io::Error) -> Error {
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::PathNotFound { path, source },
            _ => Error::Stat { path, source },
        }
    }
}
