// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Source string pool chunks.

Holds the strings referenced by source provenance records
(`path/to/source:line`). The pool layout belongs to the resource table
format, so the chunk is carried verbatim: whatever header fields follow the
envelope and the body are preserved byte for byte.
*/

use {
    crate::{
        chunk::{ChunkEnvelope, FlatChunk},
        error::FlatResult,
        serialization::{ChunkType, CHUNK_HEADER_SIZE},
        settings::ReaderSettings,
    },
    std::{borrow::Cow, io::Write},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourcePool<'a> {
    /// Header fields following the envelope.
    pub header_fields: Cow<'a, [u8]>,

    /// Pool data.
    pub data: Cow<'a, [u8]>,
}

impl<'a> SourcePool<'a> {
    pub fn into_owned(self) -> SourcePool<'static> {
        SourcePool {
            header_fields: Cow::Owned(self.header_fields.into_owned()),
            data: Cow::Owned(self.data.into_owned()),
        }
    }
}

impl<'a> FlatChunk<'a> for SourcePool<'a> {
    const CHUNK_TYPE: ChunkType = ChunkType::SourcePool;

    fn from_envelope(envelope: &ChunkEnvelope<'a>, _: &ReaderSettings) -> FlatResult<Self> {
        Ok(Self {
            header_fields: Cow::Borrowed(envelope.header_fields()),
            data: Cow::Borrowed(envelope.body()),
        })
    }

    fn header_size(&self) -> usize {
        CHUNK_HEADER_SIZE + self.header_fields.len()
    }

    fn total_size(&self) -> usize {
        self.header_size() + self.data.len()
    }

    fn write_header_fields<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        dest.write_all(&self.header_fields)?;

        Ok(())
    }

    fn write_body<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        dest.write_all(&self.data)?;

        Ok(())
    }
}
