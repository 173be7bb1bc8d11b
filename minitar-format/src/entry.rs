use crate::block::BLOCK_SIZE;
use crate::header::{EntryType, Header};
use crate::path::TarPath;

/// One member of an archive as found by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub header: Header,

    /// Position of the header block in the archive.
    pub offset: u64,
}

impl Entry {
    #[inline(always)]
    pub fn name(&self) -> &TarPath {
        &self.header.name
    }

    #[inline(always)]
    pub fn size(&self) -> u64 {
        self.header.size
    }

    #[inline(always)]
    pub fn is_regular(&self) -> bool {
        self.header.entry_type == EntryType::Regular
    }

    /// Position of the first payload byte.
    #[inline(always)]
    pub fn data_offset(&self) -> u64 {
        self.offset + BLOCK_SIZE as u64
    }

    /// Position of the next header, past this entry's padded payload.
    #[inline(always)]
    pub fn next_offset(&self) -> u64 {
        self.data_offset() + self.header.padded_size()
    }
}
