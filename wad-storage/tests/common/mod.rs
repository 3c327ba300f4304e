//! Shared helpers for building WAD images on disk

use std::io::Write;
use tempfile::NamedTempFile;
use wad_storage::types::HEADER_SIZE;

pub const MAGIC: &[u8; 4] = b"IWAD";

/// Write a well-formed WAD image to a temp file: header, data region,
/// directory table.
///
/// Lumps with data are laid out back to back after the header so the
/// directory lands exactly at the end of the data region; marker entries
/// and empty files get a zero offset.
pub fn build_wad(lumps: &[(&str, &[u8])]) -> NamedTempFile {
    let mut data = Vec::new();
    let mut table = Vec::new();

    for (name, bytes) in lumps {
        let offset = if bytes.is_empty() {
            0
        } else {
            HEADER_SIZE as usize + data.len()
        };
        table.extend_from_slice(&(offset as u32).to_le_bytes());
        table.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        let mut padded = [0u8; 8];
        padded[..name.len()].copy_from_slice(name.as_bytes());
        table.extend_from_slice(&padded);
        data.extend_from_slice(bytes);
    }

    let directory_offset = HEADER_SIZE as usize + data.len();

    let mut image = Vec::new();
    image.extend_from_slice(MAGIC);
    image.extend_from_slice(&(lumps.len() as u32).to_le_bytes());
    image.extend_from_slice(&(directory_offset as u32).to_le_bytes());
    image.extend_from_slice(&data);
    image.extend_from_slice(&table);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&image).unwrap();
    file.flush().unwrap();
    file
}

pub fn empty_wad() -> NamedTempFile {
    build_wad(&[])
}
