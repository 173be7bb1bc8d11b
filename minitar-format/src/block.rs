//! Fixed-size block I/O.

use std::cmp::min;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

/// Size of a single tar block.
pub const BLOCK_SIZE: usize = 512;

/// The end-of-archive marker is this many all-zero blocks.
pub const TERMINATOR_BLOCKS: usize = 2;

/// Length of the end-of-archive marker in bytes.
pub const TERMINATOR_LEN: u64 = (BLOCK_SIZE * TERMINATOR_BLOCKS) as u64;

/// Byte array representing a single block in a tar file.
pub type Block = [u8; BLOCK_SIZE];

const ZERO_BLOCK: Block = [0u8; BLOCK_SIZE];

/// Rounds `len` up to the next multiple of the block size.
pub fn padded_len(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    match len % block {
        0 => len,
        r => len + (block - r),
    }
}

/// Writes `payload` followed by zeros up to the next block boundary.
///
/// An already aligned payload gets no extra block.
pub fn write_padded<W: Write>(payload: &[u8], sink: &mut W) -> io::Result<()> {
    sink.write_all(payload)?;
    let padding = padded_len(payload.len() as u64) as usize - payload.len();
    sink.write_all(&ZERO_BLOCK[..padding])
}

/// Writes the two all-zero blocks that close an archive.
pub fn write_terminator<W: Write>(sink: &mut W) -> io::Result<()> {
    for _ in 0..TERMINATOR_BLOCKS {
        sink.write_all(&ZERO_BLOCK)?;
    }
    Ok(())
}

/// Reads exactly one block.
///
/// Returns `Ok(None)` only when the stream ends cleanly on a block boundary;
/// a partial block is reported as `UnexpectedEof`.
pub fn read_block<R: Read>(source: &mut R) -> io::Result<Option<Block>> {
    let mut block = [0u8; BLOCK_SIZE];

    match fill_block(source, &mut block)? {
        0 => Ok(None),
        BLOCK_SIZE => Ok(Some(block)),
        n => Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("partial block of {} bytes", n),
        )),
    }
}

/// Moves past a payload of `size` bytes and its padding without reading it.
pub fn skip_payload<S: Seek>(source: &mut S, size: u64) -> io::Result<u64> {
    let len = padded_len(size);
    source.seek(SeekFrom::Current(len as i64))?;
    Ok(len)
}

/// Streams exactly `size` payload bytes into `sink`, then drains the padding.
pub fn copy_payload<R: Read, W: Write>(source: &mut R, sink: &mut W, size: u64) -> io::Result<u64> {
    let copied = io::copy(&mut (&mut *source).take(size), sink)?;
    if copied != size {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("payload ended after {} of {} bytes", copied, size),
        ));
    }

    let mut padding = (padded_len(size) - size) as usize;
    let mut buf = [0u8; BLOCK_SIZE];
    while padding > 0 {
        let n = min(padding, BLOCK_SIZE);
        source.read_exact(&mut buf[..n])?;
        padding -= n;
    }

    Ok(padded_len(size))
}

/// Streams `source` into `sink` block by block, zero-padding the last block.
///
/// Returns the number of payload bytes read from `source`.
pub fn copy_padded<R: Read, W: Write>(source: &mut R, sink: &mut W) -> io::Result<u64> {
    let mut total = 0u64;

    loop {
        let mut block = [0u8; BLOCK_SIZE];
        let filled = fill_block(source, &mut block)?;

        if filled == 0 {
            return Ok(total);
        }

        total += filled as u64;
        write_padded(&block[..filled], sink)?;

        if filled < BLOCK_SIZE {
            return Ok(total);
        }
    }
}

/// Reads until `block` is full or the source is exhausted.
fn fill_block<R: Read>(source: &mut R, block: &mut Block) -> io::Result<usize> {
    let mut filled = 0;

    while filled < BLOCK_SIZE {
        match source.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn padding_lengths() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 512);
        assert_eq!(padded_len(512), 512);
        assert_eq!(padded_len(513), 1024);
    }

    #[test]
    fn write_padded_fills_block() {
        let mut out = Vec::new();
        write_padded(b"hi", &mut out).unwrap();
        assert_eq!(out.len(), BLOCK_SIZE);
        assert_eq!(&out[..2], b"hi");
        assert!(out[2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn write_padded_aligned_adds_nothing() {
        let mut out = Vec::new();
        write_padded(&[7u8; BLOCK_SIZE], &mut out).unwrap();
        assert_eq!(out.len(), BLOCK_SIZE);

        let mut out = Vec::new();
        write_padded(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn terminator_is_two_zero_blocks() {
        let mut out = Vec::new();
        write_terminator(&mut out).unwrap();
        assert_eq!(out.len() as u64, TERMINATOR_LEN);
        assert!(out.iter().all(|b| *b == 0));
    }

    #[test]
    fn read_block_states() {
        let mut clean = Cursor::new(vec![1u8; BLOCK_SIZE]);
        assert_eq!(read_block(&mut clean).unwrap().unwrap()[0], 1);
        assert!(read_block(&mut clean).unwrap().is_none());

        let mut partial = Cursor::new(vec![1u8; 100]);
        let err = read_block(&mut partial).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn skip_moves_past_padding() {
        let mut cursor = Cursor::new(vec![0u8; 2048]);
        assert_eq!(skip_payload(&mut cursor, 2).unwrap(), 512);
        assert_eq!(cursor.position(), 512);
        assert_eq!(skip_payload(&mut cursor, 0).unwrap(), 0);
        assert_eq!(cursor.position(), 512);
    }

    #[test]
    fn copy_payload_discards_padding() {
        let mut data = b"hello".to_vec();
        data.resize(BLOCK_SIZE, 0);
        data.extend_from_slice(&[9u8; BLOCK_SIZE]);

        let mut source = Cursor::new(data);
        let mut out = Vec::new();
        copy_payload(&mut source, &mut out, 5).unwrap();

        assert_eq!(out, b"hello");
        assert_eq!(source.position(), BLOCK_SIZE as u64);
    }

    #[test]
    fn copy_payload_short_source() {
        let mut source = Cursor::new(vec![1u8; 10]);
        let err = copy_payload(&mut source, &mut Vec::new(), 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn copy_padded_chunks() {
        let mut out = Vec::new();
        let read = copy_padded(&mut Cursor::new(vec![3u8; 700]), &mut out).unwrap();
        assert_eq!(read, 700);
        assert_eq!(out.len(), 1024);
        assert!(out[700..].iter().all(|b| *b == 0));

        let mut out = Vec::new();
        let read = copy_padded(&mut Cursor::new(Vec::<u8>::new()), &mut out).unwrap();
        assert_eq!(read, 0);
        assert!(out.is_empty());
    }
}
