//! The ustar header codec.
//!
//! A header is a single 512-byte block. Numeric fields are zero-padded octal
//! terminated by a NUL, text fields are NUL-padded, and the checksum is the
//! unsigned byte sum of the block with the checksum field read as spaces.

use std::ops::Range;

use crate::block::{Block, BLOCK_SIZE};
use crate::path::{IntoTarPathError, TarPath};

pub const NAME_RANGE: Range<usize> = 0..100;
pub const MODE_RANGE: Range<usize> = 100..108;
pub const UID_RANGE: Range<usize> = 108..116;
pub const GID_RANGE: Range<usize> = 116..124;
pub const SIZE_RANGE: Range<usize> = 124..136;
pub const MTIME_RANGE: Range<usize> = 136..148;
pub const CHECKSUM_RANGE: Range<usize> = 148..156;
pub const TYPEFLAG_OFFSET: usize = 156;
pub const LINKNAME_RANGE: Range<usize> = 157..257;
pub const MAGIC_RANGE: Range<usize> = 257..263;
pub const VERSION_RANGE: Range<usize> = 263..265;
pub const UNAME_RANGE: Range<usize> = 265..297;
pub const GNAME_RANGE: Range<usize> = 297..329;
pub const DEVMAJOR_RANGE: Range<usize> = 329..337;
pub const DEVMINOR_RANGE: Range<usize> = 337..345;

pub const MAGIC: &[u8; 6] = b"ustar\0";
pub const VERSION: &[u8; 2] = b"00";

/// Permission bits kept in the `mode` field.
pub const MODE_MASK: u32 = 0o7777;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header checksum mismatch (stored {stored:#o}, computed {computed:#o})")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("malformed header: {0}")]
    Malformed(&'static str),

    #[error("invalid member name")]
    InvalidName(#[source] IntoTarPathError),

    #[error("value {value} does not fit the `{field}` field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("negative value for the `{field}` field")]
    Negative { field: &'static str },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryType {
    Regular,
    Directory,
    Other(u8),
}

impl EntryType {
    pub const REGULAR: u8 = b'0';
    pub const DIRECTORY: u8 = b'5';

    pub fn from_byte(b: u8) -> EntryType {
        match b {
            // Pre-POSIX archives mark regular files with a NUL typeflag
            0 | Self::REGULAR => EntryType::Regular,
            Self::DIRECTORY => EntryType::Directory,
            other => EntryType::Other(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            EntryType::Regular => Self::REGULAR,
            EntryType::Directory => Self::DIRECTORY,
            EntryType::Other(b) => b,
        }
    }
}

/// Metadata of one archive member.
///
/// Built from the filesystem with [`Header::stat`] right before an entry is
/// written, or decoded from an existing header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: TarPath,
    /// Permission bits, already masked with [`MODE_MASK`].
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Exact number of payload bytes following the header.
    pub size: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: u64,
    pub entry_type: EntryType,
    pub uname: String,
    pub gname: String,
    pub devmajor: u32,
    pub devminor: u32,
}

impl Header {
    /// Serializes the header into a block, fixing up the checksum last.
    ///
    /// Fails when a value cannot be represented in its field rather than
    /// truncating it.
    pub fn encode(&self) -> Result<Block, HeaderError> {
        let mut block = [0u8; BLOCK_SIZE];

        block[NAME_RANGE][..self.name.as_bytes().len()].copy_from_slice(self.name.as_bytes());
        write_octal(&mut block[MODE_RANGE], "mode", u64::from(self.mode & MODE_MASK))?;
        write_octal(&mut block[UID_RANGE], "uid", u64::from(self.uid))?;
        write_octal(&mut block[GID_RANGE], "gid", u64::from(self.gid))?;
        write_octal(&mut block[SIZE_RANGE], "size", self.size)?;
        write_octal(&mut block[MTIME_RANGE], "mtime", self.mtime)?;
        block[TYPEFLAG_OFFSET] = self.entry_type.as_byte();
        block[MAGIC_RANGE].copy_from_slice(MAGIC);
        block[VERSION_RANGE].copy_from_slice(VERSION);
        write_str(&mut block[UNAME_RANGE], "uname", &self.uname)?;
        write_str(&mut block[GNAME_RANGE], "gname", &self.gname)?;
        write_octal(&mut block[DEVMAJOR_RANGE], "devmajor", u64::from(self.devmajor))?;
        write_octal(&mut block[DEVMINOR_RANGE], "devminor", u64::from(self.devminor))?;

        write_checksum(&mut block);
        Ok(block)
    }

    /// Parses a header block.
    ///
    /// The checksum is verified before any field is interpreted. An all-zero
    /// block is the end-of-archive sentinel and must be filtered out by the
    /// caller with [`is_zero_block`].
    pub fn decode(block: &Block) -> Result<Header, HeaderError> {
        let stored = read_octal(&block[CHECKSUM_RANGE])?;
        let computed = checksum(block);
        if stored != u64::from(computed) {
            return Err(HeaderError::ChecksumMismatch {
                stored: stored as u32,
                computed,
            });
        }

        if &block[MAGIC_RANGE] != MAGIC {
            return Err(HeaderError::Malformed("missing ustar magic"));
        }
        if &block[VERSION_RANGE] != VERSION {
            return Err(HeaderError::Malformed("unsupported ustar version"));
        }

        Ok(Header {
            name: TarPath::from_field(&block[NAME_RANGE]).map_err(HeaderError::InvalidName)?,
            mode: read_octal_u32(&block[MODE_RANGE])? & MODE_MASK,
            uid: read_octal_u32(&block[UID_RANGE])?,
            gid: read_octal_u32(&block[GID_RANGE])?,
            size: read_octal(&block[SIZE_RANGE])?,
            mtime: read_octal(&block[MTIME_RANGE])?,
            entry_type: EntryType::from_byte(block[TYPEFLAG_OFFSET]),
            uname: read_str(&block[UNAME_RANGE])?,
            gname: read_str(&block[GNAME_RANGE])?,
            devmajor: read_octal_u32(&block[DEVMAJOR_RANGE])?,
            devminor: read_octal_u32(&block[DEVMINOR_RANGE])?,
        })
    }

    /// Number of bytes the payload occupies in the archive, padding included.
    pub fn padded_size(&self) -> u64 {
        crate::block::padded_len(self.size)
    }
}

/// True iff every byte of the block is zero.
pub fn is_zero_block(block: &Block) -> bool {
    block.iter().all(|b| *b == 0)
}

/// Computes the header checksum with the checksum field counted as spaces.
pub fn checksum(block: &Block) -> u32 {
    block[..CHECKSUM_RANGE.start]
        .iter()
        .chain([b' '; 8].iter())
        .chain(block[CHECKSUM_RANGE.end..].iter())
        .map(|b| u32::from(*b))
        .sum()
}

/// Stores the checksum as six octal digits, a NUL and a space.
fn write_checksum(block: &mut Block) {
    let sum = checksum(block);
    // 512 * 0xff is 0o377000, so six digits always suffice
    let digits = format!("{:06o}", sum);
    let field = &mut block[CHECKSUM_RANGE];
    field[..6].copy_from_slice(digits.as_bytes());
    field[6] = 0;
    field[7] = b' ';
}

fn write_octal(field: &mut [u8], name: &'static str, value: u64) -> Result<(), HeaderError> {
    let width = field.len() - 1;
    let digits = format!("{:0width$o}", value, width = width);
    if digits.len() > width {
        return Err(HeaderError::FieldOverflow { field: name, value });
    }
    field[..width].copy_from_slice(digits.as_bytes());
    field[width] = 0;
    Ok(())
}

fn write_str(field: &mut [u8], name: &'static str, value: &str) -> Result<(), HeaderError> {
    let bytes = value.as_bytes();
    if bytes.len() > field.len() {
        return Err(HeaderError::FieldOverflow {
            field: name,
            value: bytes.len() as u64,
        });
    }
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn read_octal(field: &[u8]) -> Result<u64, HeaderError> {
    if field.first().map_or(false, |b| b & 0x80 != 0) {
        return Err(HeaderError::Malformed("base-256 numeric fields are not supported"));
    }

    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let text = std::str::from_utf8(&field[..end])
        .map_err(|_| HeaderError::Malformed("numeric field is not ASCII"))?
        .trim_matches(' ');

    if text.is_empty() {
        return Ok(0);
    }

    u64::from_str_radix(text, 8).map_err(|_| HeaderError::Malformed("numeric field is not octal"))
}

fn read_octal_u32(field: &[u8]) -> Result<u32, HeaderError> {
    let value = read_octal(field)?;
    if value > u64::from(u32::MAX) {
        return Err(HeaderError::Malformed("numeric field out of range"));
    }
    Ok(value as u32)
}

fn read_str(field: &[u8]) -> Result<String, HeaderError> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(|s| s.to_string())
        .map_err(|_| HeaderError::Malformed("text field is not UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            name: TarPath::new("a.txt").unwrap(),
            mode: 0o644,
            uid: 1000,
            gid: 100,
            size: 2,
            mtime: 1_600_000_000,
            entry_type: EntryType::Regular,
            uname: "alice".into(),
            gname: "users".into(),
            devmajor: 8,
            devminor: 1,
        }
    }

    #[test]
    fn field_layout() {
        let block = sample().encode().unwrap();

        assert_eq!(&block[..6], b"a.txt\0");
        assert_eq!(&block[MODE_RANGE], b"0000644\0");
        assert_eq!(&block[UID_RANGE], b"0001750\0");
        assert_eq!(&block[GID_RANGE], b"0000144\0");
        assert_eq!(&block[SIZE_RANGE], b"00000000002\0");
        assert_eq!(&block[MTIME_RANGE], b"13727410000\0");
        assert_eq!(block[TYPEFLAG_OFFSET], b'0');
        assert_eq!(&block[MAGIC_RANGE], b"ustar\0");
        assert_eq!(&block[VERSION_RANGE], b"00");
        assert_eq!(&block[UNAME_RANGE][..6], b"alice\0");
        assert_eq!(&block[GNAME_RANGE][..6], b"users\0");
        assert_eq!(&block[DEVMAJOR_RANGE], b"0000010\0");
        assert_eq!(&block[DEVMINOR_RANGE], b"0000001\0");
        assert!(block[345..].iter().all(|b| *b == 0));
    }

    #[test]
    fn checksum_field_format() {
        let block = sample().encode().unwrap();
        let field = &block[CHECKSUM_RANGE];

        assert!(field[..6].iter().all(|b| (b'0'..=b'7').contains(b)));
        assert_eq!(field[6], 0);
        assert_eq!(field[7], b' ');

        let stored = u32::from_str_radix(std::str::from_utf8(&field[..6]).unwrap(), 8).unwrap();
        assert_eq!(stored, checksum(&block));
    }

    #[test]
    fn decode_encoded() {
        let header = sample();
        let block = header.encode().unwrap();
        assert_eq!(Header::decode(&block).unwrap(), header);
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut block = sample().encode().unwrap();
        block[1] ^= 0x01;

        match Header::decode(&block) {
            Err(HeaderError::ChecksumMismatch { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn wrong_magic_is_malformed() {
        let mut block = sample().encode().unwrap();
        block[MAGIC_RANGE].copy_from_slice(b"ustar ");
        write_checksum(&mut block);

        assert_eq!(
            Header::decode(&block),
            Err(HeaderError::Malformed("missing ustar magic"))
        );
    }

    #[test]
    fn wrong_version_is_malformed() {
        let mut block = sample().encode().unwrap();
        block[VERSION_RANGE].copy_from_slice(b" \0");
        write_checksum(&mut block);

        assert_eq!(
            Header::decode(&block),
            Err(HeaderError::Malformed("unsupported ustar version"))
        );
    }

    #[test]
    fn size_overflow_is_rejected() {
        let mut header = sample();
        header.size = 0o100_000_000_000;

        assert_eq!(
            header.encode(),
            Err(HeaderError::FieldOverflow {
                field: "size",
                value: 0o100_000_000_000
            })
        );

        header.size = 0o77_777_777_777;
        assert!(header.encode().is_ok());
    }

    #[test]
    fn uid_overflow_is_rejected() {
        let mut header = sample();
        header.uid = 0o10_000_000;

        match header.encode() {
            Err(HeaderError::FieldOverflow { field: "uid", .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn blank_numeric_fields_read_as_zero() {
        let mut block = sample().encode().unwrap();
        for b in block[DEVMAJOR_RANGE].iter_mut() {
            *b = 0;
        }
        block[DEVMINOR_RANGE].copy_from_slice(b"      1 ");
        write_checksum(&mut block);

        let header = Header::decode(&block).unwrap();
        assert_eq!(header.devmajor, 0);
        assert_eq!(header.devminor, 1);
    }

    #[test]
    fn zero_block() {
        assert!(is_zero_block(&[0u8; BLOCK_SIZE]));

        let mut block = [0u8; BLOCK_SIZE];
        block[511] = 1;
        assert!(!is_zero_block(&block));
    }

    #[test]
    fn entry_types() {
        assert_eq!(EntryType::from_byte(0), EntryType::Regular);
        assert_eq!(EntryType::from_byte(b'0'), EntryType::Regular);
        assert_eq!(EntryType::from_byte(b'5'), EntryType::Directory);
        assert_eq!(EntryType::from_byte(b'2'), EntryType::Other(b'2'));
        assert_eq!(EntryType::Regular.as_byte(), b'0');
    }
}
