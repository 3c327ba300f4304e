//! WAD (Where's All the Data) archive container
//!
//! This crate parses the flat, append-oriented WAD lump directory and
//! exposes it as a hierarchical namespace: `_START`/`_END` marker pairs
//! delimit nested directories, `E<digit>M<digit>` map markers own exactly
//! the next ten lumps, and every other entry is a file. The hierarchy is
//! never stored - it is reconstructed from names and positions alone.
//!
//! Containers support in-place mutation: creating directories and files
//! inserts descriptors into the directory table, and appending file data
//! grows the data region into the table's old location, floating the
//! table forward in the file.

pub mod archive;
pub mod codec;
pub mod error;
pub mod namespace;
pub mod types;

pub use archive::WadArchive;
pub use error::{Result, WadError};

// Re-export commonly used types
pub use types::{Descriptor, DirEntry, EntryKind, LumpName};
