// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Writing of flat resources containers. */

use {
    crate::{container::Chunk, error::FlatResult},
    log::debug,
    std::io::Write,
};

/// Write a sequence of chunks as a container.
///
/// Each chunk is measured against its declared size before being written, so
/// a failure leaves `dest` holding only the chunks preceding the bad one.
/// Returns the offset of each chunk within the written data.
pub fn write_chunks<W: Write>(chunks: &[Chunk], dest: &mut W) -> FlatResult<Vec<usize>> {
    let mut offsets = Vec::with_capacity(chunks.len());
    let mut buffer = Vec::new();
    let mut offset = 0;

    for chunk in chunks {
        buffer.clear();
        chunk.write_to(&mut buffer)?;

        debug!(
            "writing chunk {:?} at offset {} ({} bytes)",
            chunk.chunk_type(),
            offset,
            buffer.len()
        );

        dest.write_all(&buffer)?;
        offsets.push(offset);
        offset += buffer.len();
    }

    Ok(offsets)
}

/// Write a sequence of chunks to a new buffer.
pub fn chunks_to_bytes(chunks: &[Chunk]) -> FlatResult<Vec<u8>> {
    let mut data = Vec::new();
    write_chunks(chunks, &mut data)?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            chunk::ChunkHeader,
            container::RawChunk,
            error::FlatError,
            public_table::PublicTable,
            serialization::ChunkType,
            source_pool::SourcePool,
            symbol_table::SymbolTable,
        },
        std::borrow::Cow,
    };

    #[test]
    fn offsets() -> anyhow::Result<()> {
        let chunks = vec![
            Chunk::from(SourcePool {
                header_fields: Cow::Borrowed(b""),
                data: Cow::Borrowed(b"abcd"),
            }),
            Chunk::from(PublicTable::default()),
            Chunk::from(SymbolTable::default()),
        ];

        let mut data = Vec::new();
        let offsets = write_chunks(&chunks, &mut data)?;

        assert_eq!(offsets, vec![0, 12, 28]);
        assert_eq!(data.len(), 40);
        assert_eq!(chunks_to_bytes(&chunks)?, data);

        Ok(())
    }

    #[test]
    fn failure_stops_before_bad_chunk() {
        let chunks = vec![
            Chunk::from(SymbolTable::default()),
            Chunk::from(RawChunk {
                header: ChunkHeader {
                    chunk_type: ChunkType::Unknown(0x4242),
                    header_size: 8,
                    total_size: 100,
                },
                header_fields: Cow::Borrowed(b""),
                body: Cow::Borrowed(b""),
            }),
        ];

        let mut data = Vec::new();
        assert!(matches!(
            write_chunks(&chunks, &mut data),
            Err(FlatError::SizeMismatchOnEncode {
                declared: 100,
                actual: 8
            })
        ));
        assert_eq!(data.len(), 12);
    }
}
