// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Chunks as they appear in a container. */

use {
    crate::{
        chunk::{ChunkEnvelope, ChunkHeader, FlatChunk},
        error::{FlatError, FlatResult},
        file_export::FileExport,
        public_table::PublicTable,
        serialization::{ChunkType, CHUNK_HEADER_SIZE},
        settings::ReaderSettings,
        source_pool::SourcePool,
        symbol_table::SymbolTable,
    },
    log::debug,
    std::{borrow::Cow, io::Write},
};

/// A chunk whose type isn't interpreted by this crate.
///
/// Its bytes are retained as-is so the chunk can be passed through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawChunk<'a> {
    pub header: ChunkHeader,

    /// Header fields following the envelope.
    pub header_fields: Cow<'a, [u8]>,

    /// Bytes after the header.
    pub body: Cow<'a, [u8]>,
}

impl<'a> RawChunk<'a> {
    pub fn from_envelope(envelope: &ChunkEnvelope<'a>) -> Self {
        Self {
            header: *envelope.header(),
            header_fields: Cow::Borrowed(envelope.header_fields()),
            body: Cow::Borrowed(envelope.body()),
        }
    }

    pub fn into_owned(self) -> RawChunk<'static> {
        RawChunk {
            header: self.header,
            header_fields: Cow::Owned(self.header_fields.into_owned()),
            body: Cow::Owned(self.body.into_owned()),
        }
    }

    /// Write the chunk.
    ///
    /// The sizes declared by the header must agree with the retained bytes.
    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        let header_size = CHUNK_HEADER_SIZE + self.header_fields.len();
        let total_size = header_size + self.body.len();

        if self.header.header_size as usize != header_size {
            return Err(FlatError::SizeMismatchOnEncode {
                declared: self.header.header_size as usize,
                actual: header_size,
            });
        }

        if self.header.total_size as usize != total_size {
            return Err(FlatError::SizeMismatchOnEncode {
                declared: self.header.total_size as usize,
                actual: total_size,
            });
        }

        self.header.write_to(dest)?;
        dest.write_all(&self.header_fields)?;
        dest.write_all(&self.body)?;

        Ok(())
    }
}

/// A decoded chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chunk<'a> {
    FileExport(FileExport<'a>),
    PublicTable(PublicTable),
    SourcePool(SourcePool<'a>),
    SymbolTable(SymbolTable<'a>),
    /// Any chunk type without a codec in this crate, including the chunk
    /// types of the resource table format itself.
    Unrecognized(RawChunk<'a>),
}

impl<'a> Chunk<'a> {
    /// Decode a chunk by dispatching on its type tag.
    ///
    /// Errors are annotated with the offset and type of the chunk.
    pub fn from_envelope(
        envelope: &ChunkEnvelope<'a>,
        settings: &ReaderSettings,
    ) -> FlatResult<Self> {
        let res = match envelope.chunk_type() {
            ChunkType::FileExport => {
                FileExport::from_envelope(envelope, settings).map(Self::FileExport)
            }
            ChunkType::PublicTable => {
                PublicTable::from_envelope(envelope, settings).map(Self::PublicTable)
            }
            ChunkType::SourcePool => {
                SourcePool::from_envelope(envelope, settings).map(Self::SourcePool)
            }
            ChunkType::SymbolTable => {
                SymbolTable::from_envelope(envelope, settings).map(Self::SymbolTable)
            }
            chunk_type => {
                debug!(
                    "passing through chunk {:?} at offset {} ({} bytes)",
                    chunk_type,
                    envelope.offset(),
                    envelope.data().len()
                );

                Ok(Self::Unrecognized(RawChunk::from_envelope(envelope)))
            }
        };

        res.map_err(|e| e.in_chunk(envelope.offset(), envelope.chunk_type().into()))
    }

    pub fn chunk_type(&self) -> ChunkType {
        match self {
            Self::FileExport(_) => ChunkType::FileExport,
            Self::PublicTable(_) => ChunkType::PublicTable,
            Self::SourcePool(_) => ChunkType::SourcePool,
            Self::SymbolTable(_) => ChunkType::SymbolTable,
            Self::Unrecognized(raw) => raw.header.chunk_type,
        }
    }

    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        match self {
            Self::FileExport(c) => c.write_to(dest),
            Self::PublicTable(c) => c.write_to(dest),
            Self::SourcePool(c) => c.write_to(dest),
            Self::SymbolTable(c) => c.write_to(dest),
            Self::Unrecognized(c) => c.write_to(dest),
        }
    }

    pub fn into_owned(self) -> Chunk<'static> {
        match self {
            Self::FileExport(c) => Chunk::FileExport(c.into_owned()),
            Self::PublicTable(c) => Chunk::PublicTable(c),
            Self::SourcePool(c) => Chunk::SourcePool(c.into_owned()),
            Self::SymbolTable(c) => Chunk::SymbolTable(c.into_owned()),
            Self::Unrecognized(c) => Chunk::Unrecognized(c.into_owned()),
        }
    }
}

impl<'a> From<FileExport<'a>> for Chunk<'a> {
    fn from(v: FileExport<'a>) -> Self {
        Self::FileExport(v)
    }
}

impl<'a> From<PublicTable> for Chunk<'a> {
    fn from(v: PublicTable) -> Self {
        Self::PublicTable(v)
    }
}

impl<'a> From<SourcePool<'a>> for Chunk<'a> {
    fn from(v: SourcePool<'a>) -> Self {
        Self::SourcePool(v)
    }
}

impl<'a> From<SymbolTable<'a>> for Chunk<'a> {
    fn from(v: SymbolTable<'a>) -> Self {
        Self::SymbolTable(v)
    }
}

impl<'a> From<RawChunk<'a>> for Chunk<'a> {
    fn from(v: RawChunk<'a>) -> Self {
        Self::Unrecognized(v)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::chunk::read_chunk_header};

    #[test]
    fn raw_round_trip() -> anyhow::Result<()> {
        let data = b"\x03\x02\x0a\x00\x0e\x00\x00\x00\xaa\xbbbody";
        let envelope = read_chunk_header(data, 0)?;

        let chunk = Chunk::from_envelope(&envelope, &ReaderSettings::default())?;
        assert_eq!(chunk.chunk_type(), ChunkType::Unknown(0x0203));

        let mut written = Vec::new();
        chunk.write_to(&mut written)?;
        assert_eq!(written, data.to_vec());

        Ok(())
    }

    #[test]
    fn raw_size_mismatch() {
        let chunk = RawChunk {
            header: ChunkHeader {
                chunk_type: ChunkType::Unknown(0x0203),
                header_size: 8,
                total_size: 16,
            },
            header_fields: Cow::Borrowed(b""),
            body: Cow::Borrowed(b"short"),
        };

        assert!(matches!(
            chunk.write_to(&mut Vec::new()),
            Err(FlatError::SizeMismatchOnEncode {
                declared: 16,
                actual: 13
            })
        ));

        let chunk = RawChunk {
            header: ChunkHeader {
                chunk_type: ChunkType::Unknown(0x0203),
                header_size: 12,
                total_size: 13,
            },
            ..chunk
        };

        assert!(matches!(
            chunk.write_to(&mut Vec::new()),
            Err(FlatError::SizeMismatchOnEncode {
                declared: 12,
                actual: 8
            })
        ));
    }

    #[test]
    fn errors_carry_location() -> anyhow::Result<()> {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"\x0d\x00\x10\x00\x10\x00\x00\x00\x01\x01\x00\x00\x00\x00\x00\x00");

        let envelope = read_chunk_header(&data, 4)?;
        let err = Chunk::from_envelope(&envelope, &ReaderSettings::default()).unwrap_err();

        assert!(matches!(
            err,
            FlatError::Chunk {
                offset: 4,
                chunk_type: 0x000d,
                ..
            }
        ));
        assert!(matches!(
            err.root(),
            FlatError::ReservedFieldViolation { field: "res0", .. }
        ));

        Ok(())
    }
}
