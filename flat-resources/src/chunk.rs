// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Chunk framing.

Every payload in a flat resources container is wrapped in an 8 byte
envelope:

* A `u16` type tag.
* A `u16` header size. This is the size of the envelope plus any fixed
  header fields of the chunk type.
* A `u32` total size. This is the size of the envelope, the header fields
  and the chunk body.

The envelope is validated without interpreting the chunk content. This allows
readers to skip chunk types they don't recognize by advancing `total_size`
bytes.
*/

use {
    crate::{
        error::{FlatError, FlatResult},
        serialization::{ChunkType, CHUNK_HEADER_SIZE},
        settings::ReaderSettings,
    },
    byteorder::{ByteOrder, LittleEndian, WriteBytesExt},
    log::debug,
    std::io::Write,
};

/// The envelope at the start of every chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    pub total_size: u32,
}

impl ChunkHeader {
    /// Construct an instance from sizes measured in `usize`.
    pub fn with_sizes(
        chunk_type: ChunkType,
        header_size: usize,
        total_size: usize,
    ) -> FlatResult<Self> {
        Ok(Self {
            chunk_type,
            header_size: u16::try_from(header_size)
                .map_err(|_| FlatError::SizeOverflow("chunk header size"))?,
            total_size: u32::try_from(total_size)
                .map_err(|_| FlatError::SizeOverflow("chunk total size"))?,
        })
    }

    /// Write the envelope.
    ///
    /// The sizes are emitted as stored. Measuring them is the job of the caller.
    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        dest.write_u16::<LittleEndian>(self.chunk_type.into())?;
        dest.write_u16::<LittleEndian>(self.header_size)?;
        dest.write_u32::<LittleEndian>(self.total_size)?;

        Ok(())
    }
}

/// A validated chunk envelope and the bytes it frames.
///
/// Instances are also the skip descriptor for chunks whose type isn't
/// recognized: [Self::end] is where the next chunk begins.
#[derive(Clone, Copy, Debug)]
pub struct ChunkEnvelope<'a> {
    offset: usize,
    header: ChunkHeader,
    data: &'a [u8],
}

impl<'a> ChunkEnvelope<'a> {
    /// Offset of the chunk within the buffer it was read from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.header.chunk_type
    }

    /// Offset of the chunk body within the buffer it was read from.
    pub fn payload_start(&self) -> usize {
        self.offset + self.header.header_size as usize
    }

    /// Offset of the first byte after this chunk.
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }

    /// All bytes of the chunk, including the envelope.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Header fields following the envelope.
    pub fn header_fields(&self) -> &'a [u8] {
        &self.data[CHUNK_HEADER_SIZE..self.header.header_size as usize]
    }

    /// Bytes after the header.
    pub fn body(&self) -> &'a [u8] {
        &self.data[self.header.header_size as usize..]
    }

    /// Ensure the chunk has the expected type.
    pub fn expect_type(&self, expected: ChunkType) -> FlatResult<()> {
        if self.header.chunk_type == expected {
            Ok(())
        } else {
            Err(FlatError::UnexpectedChunkType {
                expected: expected.into(),
                actual: self.header.chunk_type.into(),
            })
        }
    }

    /// Ensure the header is large enough to hold `required` bytes of fixed fields.
    ///
    /// `required` includes the envelope. Larger headers are only accepted if
    /// settings allow it.
    pub fn require_header_size(
        &self,
        required: usize,
        settings: &ReaderSettings,
    ) -> FlatResult<()> {
        let actual = self.header.header_size as usize;

        if actual < required {
            Err(FlatError::TruncatedOrInvalidChunk {
                offset: self.offset,
                reason: "header too small for chunk type",
            })
        } else if actual > required && !settings.allow_extended_headers() {
            Err(FlatError::TruncatedOrInvalidChunk {
                offset: self.offset,
                reason: "header larger than chunk type defines",
            })
        } else {
            if actual > required {
                debug!(
                    "ignoring {} extra header bytes in chunk {:?} at offset {}",
                    actual - required,
                    self.header.chunk_type,
                    self.offset
                );
            }

            Ok(())
        }
    }
}

/// Read and validate the chunk envelope at `offset` within `data`.
///
/// On success, the chunk is guaranteed to lie entirely within `data`.
pub fn read_chunk_header(data: &[u8], offset: usize) -> FlatResult<ChunkEnvelope<'_>> {
    let remaining = data
        .get(offset..)
        .ok_or(FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "offset beyond end of data",
        })?;

    if remaining.len() < CHUNK_HEADER_SIZE {
        return Err(FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "not enough data for chunk header",
        });
    }

    let header = ChunkHeader {
        chunk_type: ChunkType::from(LittleEndian::read_u16(&remaining[0..2])),
        header_size: LittleEndian::read_u16(&remaining[2..4]),
        total_size: LittleEndian::read_u32(&remaining[4..8]),
    };

    if (header.header_size as usize) < CHUNK_HEADER_SIZE {
        return Err(FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "header size smaller than chunk header",
        });
    }

    if header.header_size as u32 > header.total_size {
        return Err(FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "header size exceeds total size",
        });
    }

    let total_size = header.total_size as usize;

    if total_size > remaining.len() {
        return Err(FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "total size exceeds available data",
        });
    }

    Ok(ChunkEnvelope {
        offset,
        header,
        data: &remaining[..total_size],
    })
}

/// Common behavior for chunk types with a known layout.
///
/// Implementations describe how to decode a chunk from a validated envelope
/// and how to serialize its header fields and body. Framing and size
/// accounting are provided.
pub trait FlatChunk<'a>: Sized {
    /// The type tag of this chunk.
    const CHUNK_TYPE: ChunkType;

    /// Decode an instance from a validated envelope of [Self::CHUNK_TYPE].
    fn from_envelope(envelope: &ChunkEnvelope<'a>, settings: &ReaderSettings)
        -> FlatResult<Self>;

    /// Size of the envelope plus fixed header fields.
    fn header_size(&self) -> usize;

    /// Size of the entire serialized chunk.
    fn total_size(&self) -> usize;

    /// Write the fixed header fields following the envelope.
    fn write_header_fields<W: Write>(&self, dest: &mut W) -> FlatResult<()>;

    /// Write everything following the header.
    fn write_body<W: Write>(&self, dest: &mut W) -> FlatResult<()>;

    /// Parse a chunk at the start of `data` using default settings.
    fn parse(data: &'a [u8]) -> FlatResult<Self> {
        Self::parse_with_settings(data, &ReaderSettings::default())
    }

    /// Parse a chunk at the start of `data`.
    fn parse_with_settings(data: &'a [u8], settings: &ReaderSettings) -> FlatResult<Self> {
        let envelope = read_chunk_header(data, 0)?;
        envelope.expect_type(Self::CHUNK_TYPE)?;

        Self::from_envelope(&envelope, settings)
    }

    /// Serialize the chunk, including its envelope.
    ///
    /// The declared sizes are verified against what was actually written
    /// before anything reaches `dest`.
    fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        let header_size = self.header_size();
        let total_size = self.total_size();
        let header = ChunkHeader::with_sizes(Self::CHUNK_TYPE, header_size, total_size)?;

        let mut buffer = Vec::with_capacity(total_size);
        header.write_to(&mut buffer)?;
        self.write_header_fields(&mut buffer)?;

        if buffer.len() != header_size {
            return Err(FlatError::SizeMismatchOnEncode {
                declared: header_size,
                actual: buffer.len(),
            });
        }

        self.write_body(&mut buffer)?;

        if buffer.len() != total_size {
            return Err(FlatError::SizeMismatchOnEncode {
                declared: total_size,
                actual: buffer.len(),
            });
        }

        dest.write_all(&buffer)?;

        Ok(())
    }

    /// Serialize the chunk to a new buffer.
    fn to_bytes(&self) -> FlatResult<Vec<u8>> {
        let mut data = Vec::with_capacity(self.total_size());
        self.write_to(&mut data)?;

        Ok(data)
    }
}

/// Compute the byte length of `count` records of `record_size` bytes.
pub(crate) fn array_size(count: usize, record_size: usize) -> Option<usize> {
    count.checked_mul(record_size)
}
