// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Symbol table chunks.

A symbol table records byte offsets within a resource table that reference
symbols defined elsewhere. The linking stage patches each offset once the
final value of the named symbol is known.

The only header field following the envelope is a `u32` count. The body holds
exactly `count` 8 byte entries followed by the string pool holding the
symbol names. Offsets are transcoded faithfully but not validated against the
table they annotate.
*/

use {
    crate::{
        chunk::{array_size, ChunkEnvelope, FlatChunk},
        error::{FlatError, FlatResult},
        serialization::{ChunkType, SYMBOL_TABLE_ENTRY_SIZE, SYMBOL_TABLE_HEADER_SIZE},
        settings::ReaderSettings,
        string_pool::{StringPoolRef, StringPoolResolver},
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::{borrow::Cow, io::Cursor, io::Write},
};

/// A reference to an externally defined symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolTableEntry {
    /// Offset from the beginning of the resource table where the symbol
    /// is referenced.
    pub offset: u32,

    /// Name of the symbol in the chunk's string pool.
    pub name: StringPoolRef,
}

/// Offsets awaiting late-bound symbol values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable<'a> {
    pub entries: Vec<SymbolTableEntry>,

    /// Serialized string pool holding symbol names.
    pub string_pool: Cow<'a, [u8]>,
}

impl<'a> SymbolTable<'a> {
    pub fn into_owned(self) -> SymbolTable<'static> {
        SymbolTable {
            entries: self.entries,
            string_pool: Cow::Owned(self.string_pool.into_owned()),
        }
    }

    /// Resolve symbol names through a resolver for this table's string pool.
    ///
    /// Returns `(offset, name)` pairs in table order.
    pub fn resolve<'p, R: StringPoolResolver + ?Sized>(
        &self,
        pool: &'p R,
    ) -> FlatResult<Vec<(u32, Cow<'p, str>)>> {
        self.entries
            .iter()
            .map(|entry| {
                pool.resolve(entry.name)
                    .map(|name| (entry.offset, name))
                    .ok_or_else(|| FlatError::UnresolvedReference(entry.name.index()))
            })
            .collect()
    }
}

impl<'a> FlatChunk<'a> for SymbolTable<'a> {
    const CHUNK_TYPE: ChunkType = ChunkType::SymbolTable;

    fn from_envelope(
        envelope: &ChunkEnvelope<'a>,
        settings: &ReaderSettings,
    ) -> FlatResult<Self> {
        envelope.require_header_size(SYMBOL_TABLE_HEADER_SIZE, settings)?;

        let truncated = |_: std::io::Error| FlatError::TruncatedOrInvalidChunk {
            offset: envelope.offset(),
            reason: "symbol table truncated",
        };

        let count = Cursor::new(envelope.header_fields())
            .read_u32::<LittleEndian>()
            .map_err(truncated)? as usize;

        let body = envelope.body();
        let entries_length = match array_size(count, SYMBOL_TABLE_ENTRY_SIZE) {
            Some(length) if length <= body.len() => length,
            _ => {
                return Err(FlatError::TruncatedEntryList {
                    expected: count,
                    available: body.len() / SYMBOL_TABLE_ENTRY_SIZE,
                })
            }
        };

        let mut reader = Cursor::new(&body[0..entries_length]);
        let mut entries = Vec::with_capacity(count);

        for _ in 0..count {
            let offset = reader.read_u32::<LittleEndian>().map_err(truncated)?;
            let name = reader.read_u32::<LittleEndian>().map_err(truncated)?;

            entries.push(SymbolTableEntry {
                offset,
                name: name.into(),
            });
        }

        Ok(Self {
            entries,
            string_pool: Cow::Borrowed(&body[entries_length..]),
        })
    }

    fn header_size(&self) -> usize {
        SYMBOL_TABLE_HEADER_SIZE
    }

    fn total_size(&self) -> usize {
        SYMBOL_TABLE_HEADER_SIZE
            + self.entries.len() * SYMBOL_TABLE_ENTRY_SIZE
            + self.string_pool.len()
    }

    fn write_header_fields<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| FlatError::SizeOverflow("symbol table entry count"))?;

        dest.write_u32::<LittleEndian>(count)?;

        Ok(())
    }

    fn write_body<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        for entry in &self.entries {
            dest.write_u32::<LittleEndian>(entry.offset)?;
            dest.write_u32::<LittleEndian>(entry.name.into())?;
        }

        dest.write_all(&self.string_pool)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SymbolTable<'static> {
        SymbolTable {
            entries: vec![
                SymbolTableEntry {
                    offset: 0x40,
                    name: StringPoolRef::new(0),
                },
                SymbolTableEntry {
                    offset: 0x1c8,
                    name: StringPoolRef::new(1),
                },
            ],
            string_pool: Cow::Borrowed(b"\x01\x02\x03\x04\x05\x06\x07\x08"),
        }
    }

    #[test]
    fn layout() -> anyhow::Result<()> {
        let data = sample().to_bytes()?;

        assert_eq!(
            data,
            b"\x0f\x00\x0c\x00\x24\x00\x00\x00\
              \x02\x00\x00\x00\
              \x40\x00\x00\x00\x00\x00\x00\x00\
              \xc8\x01\x00\x00\x01\x00\x00\x00\
              \x01\x02\x03\x04\x05\x06\x07\x08"
                .to_vec()
        );

        assert_eq!(SymbolTable::parse(&data)?, sample());

        Ok(())
    }

    #[test]
    fn count_bounds_entries() -> anyhow::Result<()> {
        // The pool is exactly the size of an entry. Dropping the count to 1
        // must treat everything after the first entry as pool data.
        let mut data = sample().to_bytes()?;
        data[8..12].copy_from_slice(b"\x01\x00\x00\x00");

        let parsed = SymbolTable::parse(&data)?;
        assert_eq!(parsed.entries, sample().entries[0..1].to_vec());
        assert_eq!(
            parsed.string_pool.as_ref(),
            b"\xc8\x01\x00\x00\x01\x00\x00\x00\x01\x02\x03\x04\x05\x06\x07\x08"
        );

        let mut data = sample().to_bytes()?;
        data[8..12].copy_from_slice(b"\x00\x00\x00\x00");

        let parsed = SymbolTable::parse(&data)?;
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.string_pool.len(), 24);

        Ok(())
    }

    #[test]
    fn truncated_entries() -> anyhow::Result<()> {
        let mut data = sample().to_bytes()?;
        data[8..12].copy_from_slice(b"\x05\x00\x00\x00");

        assert!(matches!(
            SymbolTable::parse(&data),
            Err(FlatError::TruncatedEntryList {
                expected: 5,
                available: 3
            })
        ));

        Ok(())
    }

    #[test]
    fn empty() -> anyhow::Result<()> {
        let table = SymbolTable::default();
        let data = table.to_bytes()?;

        assert_eq!(data, b"\x0f\x00\x0c\x00\x0c\x00\x00\x00\x00\x00\x00\x00".to_vec());
        assert_eq!(SymbolTable::parse(&data)?, table);

        Ok(())
    }

    #[test]
    fn resolve_names() -> anyhow::Result<()> {
        let pool = vec!["@string/app_name", "@color/accent"];

        assert_eq!(
            sample().resolve(&pool)?,
            vec![
                (0x40, Cow::Borrowed("@string/app_name")),
                (0x1c8, Cow::Borrowed("@color/accent")),
            ]
        );

        let short_pool = vec!["@string/app_name"];
        assert!(matches!(
            sample().resolve(&short_pool),
            Err(FlatError::UnresolvedReference(1))
        ));

        Ok(())
    }
}
