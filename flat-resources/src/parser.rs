// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Parsing of flat resources containers.

A container is a sequence of chunks laid out back to back. Each chunk is
framed by its envelope, so the reader always knows where the next chunk starts
even when it can't interpret the current one.
*/

use {
    crate::{
        chunk::{read_chunk_header, ChunkEnvelope},
        container::Chunk,
        error::{FlatError, FlatResult},
        settings::{ChunkErrorPolicy, ReaderSettings},
    },
    log::warn,
    rayon::prelude::*,
};

/// An iterator over the chunks of a container.
///
/// Chunks are decoded as the iterator advances. A chunk that fails to decode
/// yields an error. Whether iteration continues afterwards is governed by
/// [ReaderSettings::chunk_error_policy]. An invalid envelope always ends
/// iteration.
pub struct ChunkParserIterator<'a> {
    done: bool,
    data: &'a [u8],
    offset: usize,
    settings: ReaderSettings,
}

impl<'a> ChunkParserIterator<'a> {
    /// Offset of the next chunk to be read.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn parse_next(&mut self) -> FlatResult<Option<Chunk<'a>>> {
        if self.offset == self.data.len() {
            self.done = true;
            return Ok(None);
        }

        let envelope = read_chunk_header(self.data, self.offset).map_err(|e| {
            self.done = true;
            e
        })?;

        // The envelope guarantees progress: total size is at least the
        // envelope size.
        self.offset = envelope.end();

        match Chunk::from_envelope(&envelope, &self.settings) {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) => {
                match self.settings.chunk_error_policy() {
                    ChunkErrorPolicy::Abort => {
                        self.done = true;
                    }
                    ChunkErrorPolicy::Skip => {
                        warn!("skipping undecodable chunk: {}", e);
                    }
                }

                Err(e)
            }
        }
    }
}

impl<'a> Iterator for ChunkParserIterator<'a> {
    type Item = FlatResult<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.parse_next().transpose()
    }
}

/// Parse a flat resources container.
///
/// The container is parsed lazily via an iterator that emits decoded [Chunk]
/// instances borrowing from `data`.
pub fn load_chunks<'a>(data: &'a [u8], settings: &ReaderSettings) -> ChunkParserIterator<'a> {
    ChunkParserIterator {
        done: false,
        data,
        offset: 0,
        settings: settings.clone(),
    }
}

/// Whether an error is confined to a single chunk whose envelope was valid.
fn is_chunk_error(e: &FlatError) -> bool {
    matches!(e, FlatError::Chunk { .. })
}

/// Decode all chunks of a container.
///
/// With [ChunkErrorPolicy::Skip], chunks failing to decode are dropped from
/// the result. Envelope errors are always returned.
pub fn read_chunks<'a>(
    data: &'a [u8],
    settings: &ReaderSettings,
) -> FlatResult<Vec<Chunk<'a>>> {
    let skip = settings.chunk_error_policy() == ChunkErrorPolicy::Skip;
    let mut chunks = vec![];

    for res in load_chunks(data, settings) {
        match res {
            Ok(chunk) => chunks.push(chunk),
            // Already logged by the iterator.
            Err(e) if skip && is_chunk_error(&e) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(chunks)
}

/// Validate the envelopes of all chunks in a container without decoding them.
pub fn scan_chunks(data: &[u8]) -> FlatResult<Vec<ChunkEnvelope<'_>>> {
    let mut envelopes = vec![];
    let mut offset = 0;

    while offset < data.len() {
        let envelope = read_chunk_header(data, offset)?;
        offset = envelope.end();
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

/// Decode all chunks of a container in parallel.
///
/// Envelopes are validated sequentially, since each chunk's location depends
/// on its predecessor. Chunk bodies occupy disjoint byte ranges and are then
/// decoded concurrently. Results are in container order and follow the same
/// error policy as [read_chunks].
pub fn decode_chunks_parallel<'a>(
    data: &'a [u8],
    settings: &ReaderSettings,
) -> FlatResult<Vec<Chunk<'a>>> {
    let envelopes = scan_chunks(data)?;

    let results = envelopes
        .par_iter()
        .map(|envelope| Chunk::from_envelope(envelope, settings))
        .collect::<Vec<_>>();

    let mut chunks = Vec::with_capacity(results.len());

    for res in results {
        match res {
            Ok(chunk) => chunks.push(chunk),
            Err(e) if settings.chunk_error_policy() == ChunkErrorPolicy::Skip => {
                warn!("skipping undecodable chunk: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            chunk::FlatChunk,
            container::RawChunk,
            file_export::{ExportedSymbol, FileExport},
            public_table::{PublicEntry, PublicTable},
            resource_config::ResourceConfig,
            serialization::{ChunkType, EntryState},
            source::EntrySource,
            string_pool::StringPoolRef,
            symbol_table::{SymbolTable, SymbolTableEntry},
            writer::write_chunks,
        },
        std::borrow::Cow,
    };

    fn file_export() -> FileExport<'static> {
        FileExport {
            version: 1,
            name: StringPoolRef::new(0),
            config: ResourceConfig::any(),
            source: StringPoolRef::new(1),
            exported_symbols: vec![ExportedSymbol {
                name: StringPoolRef::new(2),
                line: 4,
            }],
            string_pool: Cow::Borrowed(b"pool"),
        }
    }

    fn symbol_table() -> SymbolTable<'static> {
        SymbolTable {
            entries: vec![SymbolTableEntry {
                offset: 0x20,
                name: StringPoolRef::new(0),
            }],
            string_pool: Cow::Borrowed(b"names"),
        }
    }

    fn public_table() -> PublicTable {
        PublicTable {
            type_id: 1,
            entries: vec![PublicEntry {
                entry_id: 3,
                state: EntryState::Public,
                key: StringPoolRef::new(9),
                source: EntrySource::default(),
            }],
        }
    }

    const UNKNOWN_CHUNK: &[u8] =
        b"\x34\x12\x0c\x00\x10\x00\x00\x00\x01\x02\x03\x04\x05\x06\x07\x08";

    fn container() -> Vec<u8> {
        let mut data = Vec::new();
        file_export().write_to(&mut data).unwrap();
        data.extend_from_slice(UNKNOWN_CHUNK);
        symbol_table().write_to(&mut data).unwrap();

        data
    }

    #[test]
    fn empty() -> anyhow::Result<()> {
        assert!(read_chunks(b"", &ReaderSettings::default())?.is_empty());
        assert_eq!(load_chunks(b"", &ReaderSettings::default()).count(), 0);

        Ok(())
    }

    #[test]
    fn unknown_chunk_between_known() -> anyhow::Result<()> {
        let data = container();
        let chunks = read_chunks(&data, &ReaderSettings::default())?;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], Chunk::FileExport(file_export()));
        assert_eq!(chunks[2], Chunk::SymbolTable(symbol_table()));

        match &chunks[1] {
            Chunk::Unrecognized(raw) => {
                assert_eq!(raw.header.chunk_type, ChunkType::Unknown(0x1234));
                assert_eq!(raw.header_fields.as_ref(), b"\x01\x02\x03\x04");
                assert_eq!(raw.body.as_ref(), b"\x05\x06\x07\x08");
            }
            chunk => panic!("unexpected chunk: {:?}", chunk),
        }

        Ok(())
    }

    #[test]
    fn rewrite_is_identical() -> anyhow::Result<()> {
        let data = container();
        let chunks = read_chunks(&data, &ReaderSettings::default())?;

        let mut written = Vec::new();
        write_chunks(&chunks, &mut written)?;
        assert_eq!(written, data);

        Ok(())
    }

    #[test]
    fn legacy_chunk_types_pass_through() -> anyhow::Result<()> {
        // A resource table chunk is recognized as a tag but not interpreted.
        let data = b"\x02\x00\x0c\x00\x0c\x00\x00\x00\x00\x00\x00\x00";
        let chunks = read_chunks(data, &ReaderSettings::default())?;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type(), ChunkType::Table);
        assert!(matches!(chunks[0], Chunk::Unrecognized(_)));

        Ok(())
    }

    #[test]
    fn truncated_trailer() {
        let mut data = container();
        data.extend_from_slice(b"\x0f\x00\x0c");

        let mut iter = load_chunks(&data, &ReaderSettings::default());
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next(),
            Some(Err(FlatError::TruncatedOrInvalidChunk { .. }))
        ));
        assert!(iter.next().is_none());

        let settings = ReaderSettings::default().with_chunk_error_policy(ChunkErrorPolicy::Skip);
        assert!(matches!(
            read_chunks(&data, &settings),
            Err(FlatError::TruncatedOrInvalidChunk { .. })
        ));
    }

    fn container_with_bad_public_table() -> (Vec<u8>, usize) {
        let mut data = Vec::new();
        file_export().write_to(&mut data).unwrap();

        let bad_offset = data.len();
        let mut public = public_table().to_bytes().unwrap();
        // Out of range entry state.
        public[18] = 9;
        data.extend(public);

        symbol_table().write_to(&mut data).unwrap();

        (data, bad_offset)
    }

    #[test]
    fn abort_policy() {
        let (data, bad_offset) = container_with_bad_public_table();

        let mut iter = load_chunks(&data, &ReaderSettings::default());
        assert!(matches!(iter.next(), Some(Ok(Chunk::FileExport(_)))));

        let err = iter.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            FlatError::Chunk { offset, chunk_type: 0x000d, .. } if offset == bad_offset
        ));
        assert!(matches!(err.root(), FlatError::InvalidEntryState(9)));
        assert!(iter.next().is_none());

        assert!(read_chunks(&data, &ReaderSettings::default()).is_err());
    }

    #[test]
    fn skip_policy() -> anyhow::Result<()> {
        let (data, _) = container_with_bad_public_table();
        let settings = ReaderSettings::default().with_chunk_error_policy(ChunkErrorPolicy::Skip);

        let mut iter = load_chunks(&data, &settings);
        assert!(matches!(iter.next(), Some(Ok(Chunk::FileExport(_)))));
        assert!(matches!(iter.next(), Some(Err(FlatError::Chunk { .. }))));
        assert!(matches!(iter.next(), Some(Ok(Chunk::SymbolTable(_)))));
        assert!(iter.next().is_none());

        let chunks = read_chunks(&data, &settings)?;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], Chunk::SymbolTable(symbol_table()));

        Ok(())
    }

    #[test]
    fn scan_does_not_decode() -> anyhow::Result<()> {
        let (data, bad_offset) = container_with_bad_public_table();
        let envelopes = scan_chunks(&data)?;

        assert_eq!(envelopes.len(), 3);
        assert_eq!(envelopes[1].offset(), bad_offset);
        assert_eq!(envelopes[1].chunk_type(), ChunkType::PublicTable);
        assert_eq!(envelopes[2].end(), data.len());

        Ok(())
    }

    #[test]
    fn parallel_matches_sequential() -> anyhow::Result<()> {
        let mut data = container();
        for _ in 0..32 {
            public_table().write_to(&mut data)?;
            data.extend_from_slice(UNKNOWN_CHUNK);
        }

        let settings = ReaderSettings::default();
        assert_eq!(
            decode_chunks_parallel(&data, &settings)?,
            read_chunks(&data, &settings)?
        );

        let (data, _) = container_with_bad_public_table();
        assert!(matches!(
            decode_chunks_parallel(&data, &settings),
            Err(FlatError::Chunk { .. })
        ));

        let settings = settings.with_chunk_error_policy(ChunkErrorPolicy::Skip);
        assert_eq!(decode_chunks_parallel(&data, &settings)?.len(), 2);

        Ok(())
    }

    #[test]
    fn strict_headers() -> anyhow::Result<()> {
        // A symbol table with 4 extra header bytes.
        let raw = RawChunk {
            header: crate::chunk::ChunkHeader {
                chunk_type: ChunkType::SymbolTable,
                header_size: 16,
                total_size: 16,
            },
            header_fields: Cow::Borrowed(b"\x00\x00\x00\x00\xff\xff\xff\xff"),
            body: Cow::Borrowed(b""),
        };

        let mut data = Vec::new();
        raw.write_to(&mut data)?;

        let chunks = read_chunks(&data, &ReaderSettings::default())?;
        assert_eq!(chunks, vec![Chunk::SymbolTable(SymbolTable::default())]);

        let strict = ReaderSettings::default().with_allow_extended_headers(false);
        let err = read_chunks(&data, &strict).unwrap_err();
        assert!(matches!(
            err.root(),
            FlatError::TruncatedOrInvalidChunk { .. }
        ));

        Ok(())
    }
}
