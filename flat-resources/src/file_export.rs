// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! File export chunks.

A file export chunk holds an entire compiled file. It is produced once per
file by the compilation stage and consumed by the linking stage.

The header fields following the envelope are:

* 4 bytes of magic, `AAPT`.
* A `u32` version of the compiler that built the file.
* A string pool reference to the resource name.
* A configuration descriptor. Its size is self-describing.
* A string pool reference to the original source path.
* A `u32` count of exported symbols.

The body holds exactly `count` exported symbol records followed by a string
pool private to the chunk.
*/

use {
    crate::{
        chunk::{array_size, ChunkEnvelope, FlatChunk},
        error::{FlatError, FlatResult},
        resource_config::ResourceConfig,
        serialization::{
            ChunkType, EXPORTED_SYMBOL_SIZE, FILE_EXPORT_FIXED_HEADER_SIZE, FILE_EXPORT_MAGIC,
        },
        settings::ReaderSettings,
        string_pool::StringPoolRef,
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::{borrow::Cow, io::Cursor, io::Write},
};

/// A symbol a compiled file makes visible to other compilation units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExportedSymbol {
    pub name: StringPoolRef,
    pub line: u32,
}

/// A compiled file and the symbols it exports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileExport<'a> {
    /// Version of the compiler that built this file.
    pub version: u32,

    /// The resource name.
    pub name: StringPoolRef,

    /// Configuration of this file.
    pub config: ResourceConfig<'a>,

    /// Original source path of this file.
    pub source: StringPoolRef,

    /// Symbols exported by this file.
    pub exported_symbols: Vec<ExportedSymbol>,

    /// Serialized string pool scoped to this chunk.
    ///
    /// All references in this chunk index into this pool.
    pub string_pool: Cow<'a, [u8]>,
}

impl<'a> FileExport<'a> {
    pub fn into_owned(self) -> FileExport<'static> {
        FileExport {
            version: self.version,
            name: self.name,
            config: self.config.into_owned(),
            source: self.source,
            exported_symbols: self.exported_symbols,
            string_pool: Cow::Owned(self.string_pool.into_owned()),
        }
    }
}

impl<'a> FlatChunk<'a> for FileExport<'a> {
    const CHUNK_TYPE: ChunkType = ChunkType::FileExport;

    fn from_envelope(
        envelope: &ChunkEnvelope<'a>,
        settings: &ReaderSettings,
    ) -> FlatResult<Self> {
        let fields = envelope.header_fields();
        let too_small = FlatError::TruncatedOrInvalidChunk {
            offset: envelope.offset(),
            reason: "header too small for chunk type",
        };

        if fields.len() < 4 {
            return Err(too_small);
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&fields[0..4]);

        if &magic != FILE_EXPORT_MAGIC {
            return Err(FlatError::BadMagic(magic));
        }

        // Version, name and the config size field.
        if fields.len() < 16 {
            return Err(too_small);
        }

        let config = ResourceConfig::parse(&fields[12..])?;
        envelope.require_header_size(FILE_EXPORT_FIXED_HEADER_SIZE + config.len(), settings)?;

        let truncated = |_: std::io::Error| FlatError::TruncatedOrInvalidChunk {
            offset: envelope.offset(),
            reason: "file export header truncated",
        };

        let mut reader = Cursor::new(&fields[4..12]);
        let version = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let name = reader.read_u32::<LittleEndian>().map_err(truncated)?;

        let mut reader = Cursor::new(&fields[12 + config.len()..]);
        let source = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let count = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;

        let body = envelope.body();
        let available = body.len() / EXPORTED_SYMBOL_SIZE;

        let symbols_length = match array_size(count, EXPORTED_SYMBOL_SIZE) {
            Some(length) if length <= body.len() => length,
            _ => {
                return Err(FlatError::TruncatedSymbolList {
                    expected: count,
                    available,
                })
            }
        };

        let mut reader = Cursor::new(&body[0..symbols_length]);
        let mut exported_symbols = Vec::with_capacity(count);

        for _ in 0..count {
            let name = reader.read_u32::<LittleEndian>().map_err(truncated)?;
            let line = reader.read_u32::<LittleEndian>().map_err(truncated)?;

            exported_symbols.push(ExportedSymbol {
                name: name.into(),
                line,
            });
        }

        Ok(Self {
            version,
            name: name.into(),
            config,
            source: source.into(),
            exported_symbols,
            string_pool: Cow::Borrowed(&body[symbols_length..]),
        })
    }

    fn header_size(&self) -> usize {
        FILE_EXPORT_FIXED_HEADER_SIZE + self.config.len()
    }

    fn total_size(&self) -> usize {
        self.header_size()
            + self.exported_symbols.len() * EXPORTED_SYMBOL_SIZE
            + self.string_pool.len()
    }

    fn write_header_fields<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        let count = u32::try_from(self.exported_symbols.len())
            .map_err(|_| FlatError::SizeOverflow("exported symbol count"))?;

        dest.write_all(FILE_EXPORT_MAGIC)?;
        dest.write_u32::<LittleEndian>(self.version)?;
        dest.write_u32::<LittleEndian>(self.name.into())?;
        self.config.write_to(dest)?;
        dest.write_u32::<LittleEndian>(self.source.into())?;
        dest.write_u32::<LittleEndian>(count)?;

        Ok(())
    }

    fn write_body<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        for symbol in &self.exported_symbols {
            dest.write_u32::<LittleEndian>(symbol.name.into())?;
            dest.write_u32::<LittleEndian>(symbol.line)?;
        }

        dest.write_all(&self.string_pool)?;

        Ok(())
    }
}
