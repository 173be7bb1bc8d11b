//! Reading and writing POSIX ustar archives.
//!
//! An archive is a sequence of 512-byte header blocks, each followed by the
//! file payload padded to a block boundary, and closed by two all-zero
//! blocks. Only regular files with names of at most 100 bytes are written.
//!
//! The top-level functions cover the usual `tar` operations:
//!
//! ```no_run
//! # fn main() -> minitar_format::Result<()> {
//! minitar_format::create("out.tar", &["a.txt", "b.txt"])?;
//! minitar_format::append("out.tar", &["c.txt"])?;
//! assert_eq!(minitar_format::list("out.tar")?, vec!["a.txt", "b.txt", "c.txt"]);
//! # Ok(())
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("minitar-format only supports unix targets");

mod archive;
pub mod block;
mod entry;
pub mod error;
mod file;
mod fs;
pub mod header;
pub mod path;

pub use archive::{append, create, extract, extract_to, list, update, UpdateSummary};
pub use block::{Block, BLOCK_SIZE};
pub use entry::Entry;
pub use error::{Error, Result};
pub use file::{ExtractStats, TarFileReader, TarFileWriter};
pub use fs::encode_path;
pub use header::{EntryType, Header, HeaderError};
pub use path::TarPath;
