use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No files specified to add to archive")]
    NoFilesSpecified,

    #[error("Cannot create archive `{}`", .path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: minitar_format::Error,
    },

    #[error("Cannot append to archive `{}`", .path.display())]
    AppendArchive {
        path: PathBuf,
        #[source]
        source: minitar_format::Error,
    },

    #[error("Cannot update archive `{}`", .path.display())]
    UpdateArchive {
        path: PathBuf,
        #[source]
        source: minitar_format::Error,
    },

    #[error("Cannot list archive `{}`", .path.display())]
    ListArchive {
        path: PathBuf,
        #[source]
        source: minitar_format::Error,
    },

    #[error("Cannot extract archive `{}`", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: minitar_format::Error,
    },
}
