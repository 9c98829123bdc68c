// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Resource entry records.

A resource table entry starts with a base record:

* A `u16` record size.
* A `u16` of flags.
* A string pool reference to the entry key.

Entries holding a map of values extend the base record with a `u32` parent
resource ID and a `u32` count of map entries.

Legacy readers infer the extended shape from the record being larger than
the base record. That breaks down once a [EntrySource] trailer follows the
record, since the trailer makes every record look bigger. So here the shape is
an explicit variant selected by [FLAG_COMPLEX], the size field must match the
variant exactly, and the trailer is only read when the caller says it exists.
*/

use {
    crate::{
        error::{FlatError, FlatResult},
        serialization::{
            ENTRY_SOURCE_SIZE, FLAG_COMPLEX, RESOURCE_ENTRY_EXT_SIZE, RESOURCE_ENTRY_SIZE,
        },
        settings::ReaderSettings,
        source::EntrySource,
        string_pool::StringPoolRef,
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::io::{Read, Write},
};

/// Fields of the base entry record.
///
/// `flags` must not include [FLAG_COMPLEX]. That bit is derived from the
/// [EntryRecord] variant and records carrying it are rejected on write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceEntry {
    pub flags: u16,
    pub key: StringPoolRef,
}

/// The extended record of an entry holding a map of values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceEntryExt {
    pub entry: ResourceEntry,

    /// Resource ID of the parent map, or 0 if there is none.
    pub parent: u32,

    /// Number of map entries following this record.
    pub count: u32,
}

/// A resource entry record of either shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryRecord {
    Simple(ResourceEntry),
    Complex(ResourceEntryExt),
}

impl EntryRecord {
    /// Size of the serialized record.
    pub fn size(&self) -> usize {
        match self {
            Self::Simple(_) => RESOURCE_ENTRY_SIZE,
            Self::Complex(_) => RESOURCE_ENTRY_EXT_SIZE,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    pub fn entry(&self) -> &ResourceEntry {
        match self {
            Self::Simple(entry) => entry,
            Self::Complex(ext) => &ext.entry,
        }
    }

    /// Flags as stored on the wire.
    pub fn flags(&self) -> u16 {
        match self {
            Self::Simple(entry) => entry.flags,
            Self::Complex(ext) => ext.entry.flags | FLAG_COMPLEX,
        }
    }

    /// Ensure the record can be written without altering any field.
    pub fn check(&self) -> FlatResult<()> {
        if self.entry().flags & FLAG_COMPLEX != 0 {
            Err(FlatError::InvalidEntryRecord(
                "complex flag set in entry flags; use the complex variant",
            ))
        } else {
            Ok(())
        }
    }

    /// Read a record.
    ///
    /// `offset` is the location of the record and is only used for error reporting.
    pub fn read_from<R: Read>(reader: &mut R, offset: usize) -> FlatResult<Self> {
        let truncated = |_: std::io::Error| FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "entry record truncated",
        };

        let size = reader.read_u16::<LittleEndian>().map_err(truncated)? as usize;
        let flags = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        let key = reader.read_u32::<LittleEndian>().map_err(truncated)?;

        let entry = ResourceEntry {
            flags: flags & !FLAG_COMPLEX,
            key: key.into(),
        };

        if flags & FLAG_COMPLEX != 0 {
            if size != RESOURCE_ENTRY_EXT_SIZE {
                return Err(FlatError::InvalidEntryRecord(
                    "size of complex entry does not match extended record",
                ));
            }

            let parent = reader.read_u32::<LittleEndian>().map_err(truncated)?;
            let count = reader.read_u32::<LittleEndian>().map_err(truncated)?;

            Ok(Self::Complex(ResourceEntryExt {
                entry,
                parent,
                count,
            }))
        } else {
            if size != RESOURCE_ENTRY_SIZE {
                return Err(FlatError::InvalidEntryRecord(
                    "size of simple entry does not match base record",
                ));
            }

            Ok(Self::Simple(entry))
        }
    }

    /// Parse a record at the start of a slice.
    pub fn parse(data: &[u8]) -> FlatResult<Self> {
        Self::read_from(&mut &data[..], 0)
    }

    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        self.check()?;

        dest.write_u16::<LittleEndian>(self.size() as u16)?;
        dest.write_u16::<LittleEndian>(self.flags())?;
        dest.write_u32::<LittleEndian>(self.entry().key.into())?;

        if let Self::Complex(ext) = self {
            dest.write_u32::<LittleEndian>(ext.parent)?;
            dest.write_u32::<LittleEndian>(ext.count)?;
        }

        Ok(())
    }
}

/// An entry record with its optional source provenance trailer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourcedEntry {
    pub record: EntryRecord,
    pub source: Option<EntrySource>,
}

impl SourcedEntry {
    /// Size of the serialized record and trailer.
    pub fn size(&self) -> usize {
        self.record.size() + self.source.map_or(0, |_| ENTRY_SOURCE_SIZE)
    }

    /// Read a record, followed by a source trailer if settings say one is present.
    pub fn read_from<R: Read>(
        reader: &mut R,
        offset: usize,
        settings: &ReaderSettings,
    ) -> FlatResult<Self> {
        let record = EntryRecord::read_from(reader, offset)?;

        let source = if settings.entry_source_trailer() {
            Some(EntrySource::read_from(reader, offset + record.size())?)
        } else {
            None
        };

        Ok(Self { record, source })
    }

    pub fn parse(data: &[u8], settings: &ReaderSettings) -> FlatResult<Self> {
        Self::read_from(&mut &data[..], 0, settings)
    }

    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        self.record.check()?;
        if let Some(source) = &self.source {
            source.check()?;
        }

        self.record.write_to(dest)?;

        if let Some(source) = &self.source {
            source.write_to(dest)?;
        }

        Ok(())
    }
}
