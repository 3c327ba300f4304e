//! Open WAD containers: queries, bounds-checked reads, and append-only
//! mutation of the lump directory and data region.

use crate::codec::{self, Header};
use crate::error::{Result, WadError};
use crate::namespace::{self, Children, Resolved};
use crate::types::{Descriptor, DirEntry, EntryKind, DESCRIPTOR_SIZE};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace};

/// An open WAD container.
///
/// The lump directory is loaded once at open time; every operation
/// resolves its path against the in-memory sequence and then reads or
/// writes the backing file at computed positions. The container owns the
/// file handle exclusively for its lifetime.
///
/// Mutations update the in-memory directory and the on-disk layout in
/// multiple positioned writes; these steps are not atomic. A failed write
/// mid-mutation leaves the on-disk table in an undefined state and the
/// container should be considered in need of a reload. Callers must
/// serialize access - no internal locking is provided.
pub struct WadArchive {
    file: File,
    magic: [u8; 4],
    directory_offset: u32,
    descriptors: Vec<Descriptor>,
}

impl WadArchive {
    /// Open a container for reading and in-place mutation.
    ///
    /// Fails with [`WadError::Io`] when the file cannot be opened
    /// read-write and with [`WadError::Format`] when the header or the
    /// directory table cannot be fully read. The magic tag is carried
    /// through unvalidated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let header = Header::parse(&mut file)?;
        let descriptors =
            codec::read_directory(&mut file, header.directory_offset, header.lump_count)?;

        debug!(
            path = %path.display(),
            lumps = descriptors.len(),
            directory_offset = header.directory_offset,
            "opened archive"
        );

        Ok(Self {
            file,
            magic: header.magic,
            directory_offset: header.directory_offset,
            descriptors,
        })
    }

    /// The 4-byte format tag from the header.
    pub fn magic(&self) -> &[u8; 4] {
        &self.magic
    }

    /// Number of entries in the lump directory, markers included.
    pub fn lump_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Classify the entry at `path` as a file or a directory.
    pub fn kind(&self, path: &str) -> Result<EntryKind> {
        let target = namespace::resolve(&self.descriptors, path)?;
        Ok(namespace::classify(&self.descriptors, target))
    }

    /// Whether `path` resolves to a file. Resolution failures are `false`.
    pub fn is_file(&self, path: &str) -> bool {
        self.kind(path).is_ok_and(|kind| kind == EntryKind::File)
    }

    /// Whether `path` resolves to a directory. Resolution failures are
    /// `false`.
    pub fn is_directory(&self, path: &str) -> bool {
        self.kind(path).is_ok_and(|kind| kind == EntryKind::Directory)
    }

    /// Size in bytes of the file at `path`.
    pub fn size(&self, path: &str) -> Result<u64> {
        let index = self.resolve_file(path)?;
        Ok(u64::from(self.descriptors[index].size))
    }

    /// Read up to `length` bytes of the file at `path`, starting at
    /// `offset` within its data.
    ///
    /// Returns an empty buffer when `offset` is at or past the end of the
    /// file; otherwise the request is clamped to the bytes remaining, so
    /// the read never crosses the end of the lump.
    pub fn read(&mut self, path: &str, length: usize, offset: u64) -> Result<Vec<u8>> {
        let index = self.resolve_file(path)?;
        let lump = self.descriptors[index];

        let size = u64::from(lump.size);
        if offset >= size {
            return Ok(Vec::new());
        }
        let length = (length as u64).min(size - offset) as usize;

        self.file
            .seek(SeekFrom::Start(u64::from(lump.offset) + offset))?;
        let mut data = vec![0u8; length];
        self.file.read_exact(&mut data)?;

        trace!(path, length, offset, "read lump data");
        Ok(data)
    }

    /// List the immediate children of the directory at `path`, in
    /// sequence order.
    ///
    /// Namespace directories appear under their stripped name; map
    /// markers and plain lumps keep their raw name.
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>> {
        let target = namespace::resolve(&self.descriptors, path)?;
        let Some(children) = Children::of(&self.descriptors, target) else {
            return Err(WadError::NotADirectory(path.to_string()));
        };

        Ok(children
            .map(|index| DirEntry {
                name: self.descriptors[index].name.effective().to_string(),
                kind: namespace::classify(&self.descriptors, Resolved::Entry(index)),
            })
            .collect())
    }

    /// Create a directory at `path` by inserting a `_START`/`_END` marker
    /// pair.
    ///
    /// Silently does nothing when the path cannot be resolved to a legal
    /// insertion point or the final component is too long to carry the
    /// marker suffixes. This leniency is part of the container's
    /// compatibility contract, not an error.
    pub fn create_directory(&mut self, path: &str) -> Result<()> {
        let Some((index, name)) = namespace::resolve_insertion(&self.descriptors, path) else {
            debug!(path, "directory not created: no insertion point");
            return Ok(());
        };
        let Some((start, end)) = name.namespace_pair() else {
            debug!(path, "directory not created: name too long for marker suffixes");
            return Ok(());
        };

        self.descriptors
            .splice(index..index, [Descriptor::empty(start), Descriptor::empty(end)]);
        self.persist_from(index)?;

        debug!(path, index, "created directory");
        Ok(())
    }

    /// Create an empty file at `path`.
    ///
    /// Silently does nothing when the name would itself classify as a
    /// namespace or map marker, or when no legal insertion point exists.
    pub fn create_file(&mut self, path: &str) -> Result<()> {
        let Some((index, name)) = namespace::resolve_insertion(&self.descriptors, path) else {
            debug!(path, "file not created: no insertion point");
            return Ok(());
        };
        if name.is_marker() {
            debug!(path, "file not created: name uses reserved marker syntax");
            return Ok(());
        }

        self.descriptors.insert(index, Descriptor::empty(name));
        self.persist_from(index)?;

        debug!(path, index, "created file");
        Ok(())
    }

    /// Append `data` to the file at `path`.
    ///
    /// Writes are append-only and contiguous: `offset` must equal the
    /// file's current size, and unless the file is empty its data must
    /// end exactly where the directory table currently sits. On success
    /// the data lands at the old directory offset, the table is rewritten
    /// past the new end of data, and the number of bytes written is
    /// returned.
    ///
    /// Returns `Ok(0)` when a precondition fails: zero means "not
    /// written", not a zero-length success.
    pub fn write(&mut self, path: &str, data: &[u8], offset: u64) -> Result<usize> {
        let index = self.resolve_file(path)?;
        let lump = self.descriptors[index];

        if offset != u64::from(lump.size) {
            debug!(path, offset, size = lump.size, "rejected non-contiguous write");
            return Ok(0);
        }
        if lump.size == 0 {
            self.descriptors[index].offset = self.directory_offset;
        } else if u64::from(lump.offset) + u64::from(lump.size) != u64::from(self.directory_offset)
        {
            debug!(path, "rejected write: lump data does not end at the directory");
            return Ok(0);
        }

        let old_directory = self.directory_offset;
        self.directory_offset += data.len() as u32;
        self.descriptors[index].size += data.len() as u32;

        self.file
            .seek(SeekFrom::Start(codec::DIRECTORY_FIELD_OFFSET))?;
        self.file.write_u32::<LittleEndian>(self.directory_offset)?;
        self.file.seek(SeekFrom::Start(u64::from(old_directory)))?;
        self.file.write_all(data)?;
        self.persist_from(0)?;

        debug!(path, bytes = data.len(), offset, "appended lump data");
        Ok(data.len())
    }

    /// Resolve `path` to the table index of a file descriptor.
    fn resolve_file(&self, path: &str) -> Result<usize> {
        match namespace::resolve(&self.descriptors, path)? {
            Resolved::Entry(index)
                if namespace::classify(&self.descriptors, Resolved::Entry(index))
                    == EntryKind::File =>
            {
                Ok(index)
            }
            _ => Err(WadError::NotAFile(path.to_string())),
        }
    }

    /// Persist the lump count and the directory suffix from `index` to
    /// the end of the table, at the table's current on-disk position.
    ///
    /// No partial-write recovery is attempted; a failure here leaves the
    /// on-disk table in an undefined state.
    fn persist_from(&mut self, index: usize) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(codec::COUNT_FIELD_OFFSET))?;
        self.file
            .write_u32::<LittleEndian>(self.descriptors.len() as u32)?;

        let mut buffer =
            Vec::with_capacity((self.descriptors.len() - index) * DESCRIPTOR_SIZE as usize);
        for descriptor in &self.descriptors[index..] {
            descriptor.write_to(&mut buffer)?;
        }
        self.file.seek(SeekFrom::Start(codec::entry_position(
            self.directory_offset,
            index,
        )))?;
        self.file.write_all(&buffer)?;
        Ok(())
    }
}
