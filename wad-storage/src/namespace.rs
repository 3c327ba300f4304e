//! Hierarchical namespace over the flat lump directory
//!
//! The directory stores no parent/child links. The tree is reconstructed
//! from naming conventions and position alone: a `_START` marker opens a
//! directory that runs to its depth-matched `_END` marker, a map marker
//! (`E<digit>M<digit>`) owns exactly the next ten entries with no closing
//! marker, and every other entry is a plain lump. Resolution and listing
//! are pure functions over index ranges into the descriptor sequence.

use crate::error::{Result, WadError};
use crate::types::{Descriptor, EntryKind, LumpName, MAP_BLOCK_LEN, NAME_SIZE};

/// A resolved path target: the conceptual root or a directory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Root,
    Entry(usize),
}

/// Classify a resolved target. The root and both marker kinds are
/// directories; everything else is a file.
pub fn classify(table: &[Descriptor], target: Resolved) -> EntryKind {
    match target {
        Resolved::Root => EntryKind::Directory,
        Resolved::Entry(index) => {
            let name = &table[index].name;
            if name.is_namespace_start() || name.is_map_marker() {
                EntryKind::Directory
            } else {
                EntryKind::File
            }
        }
    }
}

/// Advance from the entry at `index` to its next sibling.
///
/// Namespace spans are stepped over whole, tracking nested start/end depth
/// so inner pairs are not mistaken for the outer boundary; a map marker is
/// stepped over together with its ten children. Malformed tables (an
/// unmatched `_START`, a truncated map block) clamp at the end of the
/// table instead of running past it.
pub fn skip(table: &[Descriptor], index: usize) -> usize {
    let mut cursor = index;
    let mut depth = 0i32;
    loop {
        let name = &table[cursor].name;
        if name.is_namespace_start() {
            depth += 1;
        } else if name.is_namespace_end() {
            depth -= 1;
        } else if name.is_map_marker() {
            cursor += MAP_BLOCK_LEN;
        }
        cursor += 1;
        if depth <= 0 || cursor >= table.len() {
            return cursor.min(table.len());
        }
    }
}

/// Iteration scope for the immediate children of a directory.
enum Scope {
    /// The entire top-level sequence.
    Root,
    /// Between a `_START` marker and its matching `_END`.
    Namespace,
    /// The fixed ten entries after a map marker, taken verbatim.
    MapBlock { remaining: usize },
}

/// Walks the immediate children of a resolved directory in sequence
/// order, stepping over nested directories as opaque units.
///
/// After the walk is exhausted, [`Children::cursor`] is the index one past
/// the directory's span: end of table for the root, the `_END` marker for
/// a namespace, the eleventh entry for a map block. That position doubles
/// as the insertion point for a new entry in this directory.
pub struct Children<'a> {
    table: &'a [Descriptor],
    scope: Scope,
    cursor: usize,
}

impl<'a> Children<'a> {
    /// Walker over the immediate children of `target`, or `None` when the
    /// target is a plain lump.
    pub fn of(table: &'a [Descriptor], target: Resolved) -> Option<Self> {
        let (scope, cursor) = match target {
            Resolved::Root => (Scope::Root, 0),
            Resolved::Entry(index) => {
                let name = &table[index].name;
                if name.is_namespace_start() {
                    (Scope::Namespace, index + 1)
                } else if name.is_map_marker() {
                    (
                        Scope::MapBlock {
                            remaining: MAP_BLOCK_LEN,
                        },
                        index + 1,
                    )
                } else {
                    return None;
                }
            }
        };
        Some(Self {
            table,
            scope,
            cursor,
        })
    }

    /// Table index one past the last visited position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cursor >= self.table.len() {
            return None;
        }
        match &mut self.scope {
            Scope::Root => {
                let index = self.cursor;
                self.cursor = skip(self.table, index);
                Some(index)
            }
            Scope::Namespace => {
                if self.table[self.cursor].name.is_namespace_end() {
                    return None;
                }
                let index = self.cursor;
                self.cursor = skip(self.table, index);
                Some(index)
            }
            Scope::MapBlock { remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                let index = self.cursor;
                self.cursor += 1;
                Some(index)
            }
        }
    }
}

/// Outcome of scanning one directory level for a component.
enum Found {
    At(usize),
    /// Not present; `gap` is the index where it would be inserted.
    Missing { gap: usize },
}

/// Scan the immediate children of `parent` for `wanted`.
///
/// The comparison target for a namespace start marker is its stripped
/// name; map markers and plain lumps match on the raw name. The first
/// match in sequence order wins. `None` means `parent` is not a
/// directory.
fn find_child(table: &[Descriptor], parent: Resolved, wanted: LumpName) -> Option<Found> {
    let mut walker = Children::of(table, parent)?;
    for index in walker.by_ref() {
        if table[index].name.effective() == wanted {
            return Some(Found::At(index));
        }
    }
    Some(Found::Missing {
        gap: walker.cursor(),
    })
}

/// Split a slash-rooted path into name components.
///
/// Leading and repeated separators are ignored. Rejects non-rooted paths
/// and components longer than the 8-byte name field.
fn components(path: &str) -> Result<Vec<LumpName>> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(WadError::InvalidPath(path.to_string()));
    };
    let mut parts = Vec::new();
    for part in rest.split('/') {
        if part.is_empty() {
            continue;
        }
        if part.len() > NAME_SIZE {
            return Err(WadError::InvalidPath(path.to_string()));
        }
        if let Some(name) = LumpName::from_bytes(part.as_bytes()) {
            parts.push(name);
        }
    }
    Ok(parts)
}

/// Resolve a slash-rooted path to a directory entry.
///
/// Walks one component at a time, scanning only the immediate children of
/// the current directory. `/` (with any number of separators) resolves to
/// the root.
pub fn resolve(table: &[Descriptor], path: &str) -> Result<Resolved> {
    let mut target = Resolved::Root;
    for component in components(path)? {
        target = match find_child(table, target, component) {
            None => return Err(WadError::NotADirectory(path.to_string())),
            Some(Found::At(index)) => Resolved::Entry(index),
            Some(Found::Missing { .. }) => return Err(WadError::NotFound(path.to_string())),
        };
    }
    Ok(target)
}

/// Resolve a path to the insertion point for a new leaf entry.
///
/// Every parent component must resolve to an existing directory, the
/// final component must not exist yet, and the gap it lands in must be a
/// position where the directory can legally grow: the end of the table or
/// immediately before a namespace `_END` marker. Any other outcome -
/// including a malformed path - yields `None`, which callers treat as a
/// silent no-op.
pub fn resolve_insertion(table: &[Descriptor], path: &str) -> Option<(usize, LumpName)> {
    let parts = components(path).ok()?;
    let (last, parents) = parts.split_last()?;

    let mut target = Resolved::Root;
    for component in parents {
        target = match find_child(table, target, *component)? {
            Found::At(index) => Resolved::Entry(index),
            Found::Missing { .. } => return None,
        };
    }

    match find_child(table, target, *last)? {
        Found::At(_) => None,
        Found::Missing { gap } => {
            let insertable = gap == table.len() || table[gap].name.is_namespace_end();
            insertable.then_some((gap, *last))
        }
    }
}
