//! FIFF tag headers and payload readers.
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬────────────┐
//! │  kind : i32  │  type : u32  │  size : i32  │ next : i32 │  16 bytes, big-endian
//! ├──────────────┴──────────────┴──────────────┴────────────┤
//! │  size bytes of payload                                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `next == 0`: the next tag follows the payload.  `next > 0`: absolute
//! offset of the next tag.  `next == -1`: end of the chain.
use std::io::{Read, Seek, SeekFrom};
use anyhow::{bail, Context, Result};

use super::constants::*;

/// A tag header without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub kind:  i32,
    pub ftype: u32,
    pub size:  i32,
    pub next:  i32,
    /// Byte offset of the header in the file.
    pub pos:   u64,
}

impl TagHeader {
    #[inline]
    pub fn data_pos(&self) -> u64 {
        self.pos + 16
    }

    /// Offset of the following tag header, `None` at the end of the chain.
    pub fn next_pos(&self) -> Option<u64> {
        match self.next {
            FIFFV_NEXT_SEQ => Some(self.pos + 16 + self.size.max(0) as u64),
            n if n > 0     => Some(n as u64),
            _              => None,
        }
    }
}

fn be_i32(b: &[u8]) -> i32 {
    i32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Read the 16-byte header at `pos`.
pub fn read_tag_header<R: Read + Seek>(reader: &mut R, pos: u64) -> Result<TagHeader> {
    reader.seek(SeekFrom::Start(pos))
        .with_context(|| format!("seek to tag header @ {pos:#x}"))?;
    let mut buf = [0u8; 16];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read tag header @ {pos:#x}"))?;
    Ok(TagHeader {
        kind:  be_i32(&buf[0..4]),
        ftype: be_u32(&buf[4..8]),
        size:  be_i32(&buf[8..12]),
        next:  be_i32(&buf[12..16]),
        pos,
    })
}

pub fn read_i32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<i32> {
    seek_data(reader, tag)?;
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

pub fn read_f32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<f32> {
    seek_data(reader, tag)?;
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_be_bytes(buf))
}

/// Latin-1 string payload.
pub fn read_string<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<String> {
    let bytes = read_raw_bytes(reader, tag)?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

pub fn read_raw_bytes<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<u8>> {
    seek_data(reader, tag)?;
    let mut buf = vec![0u8; tag.size.max(0) as usize];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read {} payload bytes of tag {}", tag.size, tag.kind))?;
    Ok(buf)
}

/// Decode a `FIFFT_DIR_ENTRY_STRUCT` payload.  Each 16-byte entry mirrors a
/// tag header whose last field is the tag's file position.
pub fn read_directory<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<TagHeader>> {
    if tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
        bail!("expected FIFFT_DIR_ENTRY_STRUCT, got {}", tag.ftype);
    }
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw
        .chunks_exact(16)
        .map(|e| TagHeader {
            kind:  be_i32(&e[0..4]),
            ftype: be_u32(&e[4..8]),
            size:  be_i32(&e[8..12]),
            next:  FIFFV_NEXT_NONE,
            pos:   be_u32(&e[12..16]) as u64,
        })
        .collect())
}

#[inline]
fn seek_data<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<()> {
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to tag data @ {:#x}", tag.data_pos()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag_bytes(kind: i32, ftype: u32, payload: &[u8], next: i32) -> Vec<u8> {
        let mut b = Vec::with_capacity(16 + payload.len());
        b.extend_from_slice(&kind.to_be_bytes());
        b.extend_from_slice(&ftype.to_be_bytes());
        b.extend_from_slice(&(payload.len() as i32).to_be_bytes());
        b.extend_from_slice(&next.to_be_bytes());
        b.extend_from_slice(payload);
        b
    }

    #[test]
    fn reads_sfreq_tag() {
        let bytes = tag_bytes(FIFF_SFREQ, FIFFT_FLOAT, &1000_f32.to_be_bytes(), FIFFV_NEXT_NONE);
        let mut cursor = Cursor::new(bytes);
        let tag = read_tag_header(&mut cursor, 0).unwrap();
        assert_eq!(tag.kind, FIFF_SFREQ);
        assert_eq!(tag.size, 4);
        approx::assert_abs_diff_eq!(read_f32(&mut cursor, &tag).unwrap(), 1000.0);
    }

    #[test]
    fn chained_tags_follow_next() {
        let mut bytes = tag_bytes(FIFF_NCHAN, FIFFT_INT, &306_i32.to_be_bytes(), FIFFV_NEXT_SEQ);
        bytes.extend(tag_bytes(FIFF_DESCRIPTION, FIFFT_STRING, b"audvis", FIFFV_NEXT_NONE));
        let mut cursor = Cursor::new(bytes);

        let first = read_tag_header(&mut cursor, 0).unwrap();
        assert_eq!(read_i32(&mut cursor, &first).unwrap(), 306);
        let second = read_tag_header(&mut cursor, first.next_pos().unwrap()).unwrap();
        assert_eq!(second.pos, 20);
        assert_eq!(read_string(&mut cursor, &second).unwrap(), "audvis");
        assert_eq!(second.next_pos(), None);
    }

    #[test]
    fn explicit_next_offset() {
        let tag = TagHeader { kind: 1, ftype: 3, size: 8, next: 5000, pos: 100 };
        assert_eq!(tag.next_pos(), Some(5000));
    }

    #[test]
    fn directory_requires_dir_entry_type() {
        let bytes = tag_bytes(FIFF_DIR_POINTER, FIFFT_INT, &(-1_i32).to_be_bytes(), -1);
        let mut cursor = Cursor::new(bytes);
        let tag = read_tag_header(&mut cursor, 0).unwrap();
        assert!(read_directory(&mut cursor, &tag).is_err());
    }
}
