// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Declares the foundational wire primitives of flat resource containers.

All multi-byte integers are little-endian, matching the resource table
format these chunk types extend.
*/

use crate::error::FlatError;

/// Size of the `{type, header_size, total_size}` envelope preceding every chunk.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Magic bytes at the start of a file export header.
pub const FILE_EXPORT_MAGIC: &[u8; 4] = b"AAPT";

/// Index value denoting the absence of a string pool reference.
pub const NO_INDEX: u32 = 0xffff_ffff;

/// Value type of a raw string that hasn't had escape sequences processed
/// nor whitespace removed.
///
/// This never ends up on a device. It is consumed by value normalization.
pub const TYPE_RAW_STRING: u8 = 0xfe;

/// Fixed header size of a file export chunk, excluding the configuration descriptor.
pub const FILE_EXPORT_FIXED_HEADER_SIZE: usize = CHUNK_HEADER_SIZE + 4 + 4 + 4 + 4 + 4;

/// Header size of a public table chunk.
pub const PUBLIC_HEADER_SIZE: usize = CHUNK_HEADER_SIZE + 1 + 1 + 2 + 4;

/// Header size of a symbol table chunk.
pub const SYMBOL_TABLE_HEADER_SIZE: usize = CHUNK_HEADER_SIZE + 4;

/// Size of a serialized exported symbol record.
pub const EXPORTED_SYMBOL_SIZE: usize = 8;

/// Size of a serialized public entry, including its source record.
pub const PUBLIC_ENTRY_SIZE: usize = 2 + 2 + 4 + ENTRY_SOURCE_SIZE;

/// Size of a serialized source provenance record.
pub const ENTRY_SOURCE_SIZE: usize = 12;

/// Size of a serialized symbol table entry.
pub const SYMBOL_TABLE_ENTRY_SIZE: usize = 8;

/// Size of a base resource table entry record.
pub const RESOURCE_ENTRY_SIZE: usize = 8;

/// Size of the alternative (complex) entry record.
pub const RESOURCE_ENTRY_EXT_SIZE: usize = RESOURCE_ENTRY_SIZE + 4 + 4;

/// Resource entry flag: the entry holds a map of values.
pub const FLAG_COMPLEX: u16 = 0x0001;

/// Resource entry flag: the entry is publicly visible.
pub const FLAG_PUBLIC: u16 = 0x0002;

/// Resource entry flag: the entry may be overridden by other definitions.
pub const FLAG_WEAK: u16 = 0x0004;

/// Describes the type tag of a chunk.
///
/// Tags not known to this crate are preserved as [ChunkType::Unknown] so
/// they can be skipped and re-emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// A string pool as defined by the resource table format.
    StringPool,
    /// A resource table as defined by the resource table format.
    Table,
    /// A chunk holding an entire compiled file.
    FileExport,
    /// A chunk holding the visibility of entries of a single type.
    PublicTable,
    /// A string pool for source entries (`path/to/source:line`).
    SourcePool,
    /// A chunk holding names of externally defined symbols and offsets
    /// to where they are referenced in the table.
    SymbolTable,
    /// Any other tag.
    Unknown(u16),
}

impl From<u16> for ChunkType {
    fn from(v: u16) -> Self {
        match v {
            0x0001 => Self::StringPool,
            0x0002 => Self::Table,
            0x000c => Self::FileExport,
            0x000d => Self::PublicTable,
            0x000e => Self::SourcePool,
            0x000f => Self::SymbolTable,
            _ => Self::Unknown(v),
        }
    }
}

impl From<ChunkType> for u16 {
    fn from(v: ChunkType) -> Self {
        match v {
            ChunkType::StringPool => 0x0001,
            ChunkType::Table => 0x0002,
            ChunkType::FileExport => 0x000c,
            ChunkType::PublicTable => 0x000d,
            ChunkType::SourcePool => 0x000e,
            ChunkType::SymbolTable => 0x000f,
            ChunkType::Unknown(v) => v,
        }
    }
}

/// Visibility state of a public table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryState {
    Undefined,
    Public,
    Private,
}

impl Default for EntryState {
    fn default() -> Self {
        Self::Undefined
    }
}

impl From<EntryState> for u16 {
    fn from(v: EntryState) -> Self {
        match v {
            EntryState::Undefined => 0,
            EntryState::Public => 1,
            EntryState::Private => 2,
        }
    }
}

impl TryFrom<u16> for EntryState {
    type Error = FlatError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Undefined),
            1 => Ok(Self::Public),
            2 => Ok(Self::Private),
            _ => Err(FlatError::InvalidEntryState(value)),
        }
    }
}
