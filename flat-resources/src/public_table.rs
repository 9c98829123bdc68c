// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Public table chunks.

A public table chunk records, for a single resource type, the visibility
of its entries. The header fields following the envelope are a `u8` type ID,
a reserved `u8`, a reserved `u16` and a `u32` entry count. Both reserved
fields must be zero. The body holds exactly `count` 20 byte entries.
*/

use {
    crate::{
        chunk::{array_size, ChunkEnvelope, FlatChunk},
        error::{FlatError, FlatResult},
        serialization::{ChunkType, EntryState, PUBLIC_ENTRY_SIZE, PUBLIC_HEADER_SIZE},
        settings::ReaderSettings,
        source::EntrySource,
        string_pool::StringPoolRef,
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    log::warn,
    std::{collections::BTreeSet, io::Cursor, io::Write},
};

/// Visibility of a single resource entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PublicEntry {
    pub entry_id: u16,
    pub state: EntryState,
    pub key: StringPoolRef,
    pub source: EntrySource,
}

/// The visibility table of all entries of a resource type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicTable {
    /// The ID of the type this table refers to.
    pub type_id: u8,

    pub entries: Vec<PublicEntry>,
}

impl PublicTable {
    /// Obtain the entry with the given ID.
    pub fn entry(&self, entry_id: u16) -> Option<&PublicEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    /// Iterate over entries that are publicly visible.
    pub fn public_entries(&self) -> impl Iterator<Item = &PublicEntry> {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Public)
    }

    fn check_unique_ids(&self) -> FlatResult<()> {
        let mut seen = BTreeSet::new();

        for entry in &self.entries {
            if !seen.insert(entry.entry_id) {
                return Err(FlatError::DuplicateEntryId(entry.entry_id));
            }
        }

        Ok(())
    }
}

impl<'a> FlatChunk<'a> for PublicTable {
    const CHUNK_TYPE: ChunkType = ChunkType::PublicTable;

    fn from_envelope(
        envelope: &ChunkEnvelope<'a>,
        settings: &ReaderSettings,
    ) -> FlatResult<Self> {
        envelope.require_header_size(PUBLIC_HEADER_SIZE, settings)?;

        let truncated = |_: std::io::Error| FlatError::TruncatedOrInvalidChunk {
            offset: envelope.offset(),
            reason: "public table truncated",
        };

        let mut reader = Cursor::new(envelope.header_fields());
        let type_id = reader.read_u8().map_err(truncated)?;
        let res0 = reader.read_u8().map_err(truncated)?;
        let res1 = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        let count = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;

        if res0 != 0 {
            return Err(FlatError::ReservedFieldViolation {
                field: "res0",
                value: res0 as u32,
            });
        }
        if res1 != 0 {
            return Err(FlatError::ReservedFieldViolation {
                field: "res1",
                value: res1 as u32,
            });
        }

        let body = envelope.body();
        let entries_length = match array_size(count, PUBLIC_ENTRY_SIZE) {
            Some(length) if length <= body.len() => length,
            _ => {
                return Err(FlatError::TruncatedEntryList {
                    expected: count,
                    available: body.len() / PUBLIC_ENTRY_SIZE,
                })
            }
        };

        if entries_length < body.len() {
            warn!(
                "dropping {} bytes after entries of public table at offset {}",
                body.len() - entries_length,
                envelope.offset()
            );
        }

        let mut reader = Cursor::new(&body[0..entries_length]);
        let mut entries = Vec::with_capacity(count);

        for i in 0..count {
            let entry_offset = envelope.payload_start() + i * PUBLIC_ENTRY_SIZE;

            let entry_id = reader.read_u16::<LittleEndian>().map_err(truncated)?;
            let state = reader.read_u16::<LittleEndian>().map_err(truncated)?;
            let state = EntryState::try_from(state)?;
            let key = reader.read_u32::<LittleEndian>().map_err(truncated)?;
            let source = EntrySource::read_from(&mut reader, entry_offset + 8)?;

            entries.push(PublicEntry {
                entry_id,
                state,
                key: key.into(),
                source,
            });
        }

        let table = Self { type_id, entries };
        table.check_unique_ids()?;

        Ok(table)
    }

    fn header_size(&self) -> usize {
        PUBLIC_HEADER_SIZE
    }

    fn total_size(&self) -> usize {
        PUBLIC_HEADER_SIZE + self.entries.len() * PUBLIC_ENTRY_SIZE
    }

    fn write_header_fields<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        self.check_unique_ids()?;

        let count = u32::try_from(self.entries.len())
            .map_err(|_| FlatError::SizeOverflow("public entry count"))?;

        dest.write_u8(self.type_id)?;
        dest.write_u8(0)?;
        dest.write_u16::<LittleEndian>(0)?;
        dest.write_u32::<LittleEndian>(count)?;

        Ok(())
    }

    fn write_body<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        for entry in &self.entries {
            dest.write_u16::<LittleEndian>(entry.entry_id)?;
            dest.write_u16::<LittleEndian>(entry.state.into())?;
            dest.write_u32::<LittleEndian>(entry.key.into())?;
            entry.source.write_to(dest)?;
        }

        Ok(())
    }
}
