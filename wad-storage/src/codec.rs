//! Binary codec for the container header and lump directory
//!
//! The layout is fixed and bit-exact: a 12-byte header (4-byte magic,
//! little-endian lump count, little-endian directory offset) followed by
//! the data region, with the 16-byte-per-entry directory table at the
//! offset named in the header. The table floats forward as data is
//! appended.

use crate::error::{Result, WadError};
use crate::types::{Descriptor, LumpName, DESCRIPTOR_SIZE, NAME_SIZE};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::trace;

/// Byte offset of the lump count field within the header.
pub const COUNT_FIELD_OFFSET: u64 = 4;

/// Byte offset of the directory offset field within the header.
pub const DIRECTORY_FIELD_OFFSET: u64 = 8;

/// Container header: format tag plus the location of the lump directory.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    /// 4-byte format tag, carried through unvalidated.
    pub magic: [u8; 4],
    /// Number of entries in the lump directory.
    pub lump_count: u32,
    /// Byte offset of the lump directory in the backing file.
    pub directory_offset: u32,
}

impl Header {
    /// Parse the fixed 12-byte header.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(truncated("header magic"))?;
        let lump_count = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("lump count"))?;
        let directory_offset = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("directory offset"))?;

        Ok(Self {
            magic,
            lump_count,
            directory_offset,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.lump_count)?;
        writer.write_u32::<LittleEndian>(self.directory_offset)
    }
}

impl Descriptor {
    /// Parse one 16-byte directory entry.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let offset = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("entry offset"))?;
        let size = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("entry size"))?;
        let mut name = [0u8; NAME_SIZE];
        reader
            .read_exact(&mut name)
            .map_err(truncated("entry name"))?;

        Ok(Self {
            offset,
            size,
            name: LumpName::new(name),
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_all(self.name.as_bytes())
    }
}

/// Read `count` directory entries starting at `offset`.
pub fn read_directory<R: Read + Seek>(
    reader: &mut R,
    offset: u32,
    count: u32,
) -> Result<Vec<Descriptor>> {
    reader.seek(SeekFrom::Start(u64::from(offset)))?;
    let mut directory = Vec::with_capacity(count as usize);
    for _ in 0..count {
        directory.push(Descriptor::parse(reader)?);
    }
    trace!(count, offset, "read lump directory");
    Ok(directory)
}

/// File position of the directory entry at `index` for a table residing
/// at `directory_offset`.
pub fn entry_position(directory_offset: u32, index: usize) -> u64 {
    u64::from(directory_offset) + index as u64 * DESCRIPTOR_SIZE
}

fn truncated(what: &'static str) -> impl FnOnce(io::Error) -> WadError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WadError::Format(format!("truncated {what}"))
        } else {
            WadError::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let data = vec![
            b'I', b'W', b'A', b'D', // Magic
            3, 0, 0, 0, // Lump count (3, little-endian)
            0x2C, 1, 0, 0, // Directory offset (300, little-endian)
        ];

        let mut cursor = Cursor::new(data);
        let header = Header::parse(&mut cursor).unwrap();

        assert_eq!(&header.magic, b"IWAD");
        assert_eq!(header.lump_count, 3);
        assert_eq!(header.directory_offset, 300);
    }

    #[test]
    fn test_header_round_trip() {
        let header = Header {
            magic: *b"PWAD",
            lump_count: 7,
            directory_offset: 1234,
        };

        let mut buffer = Vec::new();
        header.write_to(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 12);

        let parsed = Header::parse(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(&parsed.magic, b"PWAD");
        assert_eq!(parsed.lump_count, 7);
        assert_eq!(parsed.directory_offset, 1234);
    }

    #[test]
    fn test_truncated_header_is_a_format_error() {
        let mut cursor = Cursor::new(vec![b'I', b'W', b'A', b'D', 1, 0]);
        assert!(matches!(
            Header::parse(&mut cursor),
            Err(WadError::Format(_))
        ));
    }

    #[test]
    fn test_descriptor_layout() {
        let data = vec![
            12, 0, 0, 0, // Data offset (little-endian)
            5, 0, 0, 0, // Data size (little-endian)
            b'E', b'1', b'M', b'1', 0, 0, 0, 0, // Name, NUL-padded
        ];

        let mut cursor = Cursor::new(data);
        let entry = Descriptor::parse(&mut cursor).unwrap();

        assert_eq!(entry.offset, 12);
        assert_eq!(entry.size, 5);
        assert_eq!(entry.name.to_string(), "E1M1");
    }

    #[test]
    fn test_descriptor_round_trip_keeps_full_width_names() {
        let entry = Descriptor {
            offset: 64,
            size: 128,
            name: LumpName::new(*b"ABCDEFGH"),
        };

        let mut buffer = Vec::new();
        entry.write_to(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 16);

        let parsed = Descriptor::parse(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(parsed.offset, 64);
        assert_eq!(parsed.size, 128);
        assert_eq!(parsed.name.as_bytes(), b"ABCDEFGH");
    }

    #[test]
    fn test_short_directory_is_a_format_error() {
        // Header promises two entries, the file carries one and a half.
        let mut image = Vec::new();
        Descriptor::empty(LumpName::new(*b"A\0\0\0\0\0\0\0"))
            .write_to(&mut image)
            .unwrap();
        image.extend_from_slice(&[0u8; 8]);

        let mut cursor = Cursor::new(image);
        assert!(matches!(
            read_directory(&mut cursor, 0, 2),
            Err(WadError::Format(_))
        ));
    }

    #[test]
    fn test_entry_position() {
        assert_eq!(entry_position(12, 0), 12);
        assert_eq!(entry_position(12, 3), 12 + 48);
    }
}
