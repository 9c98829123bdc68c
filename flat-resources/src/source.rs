// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Source provenance records.

A source record describes where a resource entry was defined. It has no
chunk framing of its own and is always embedded after another record.
*/

use {
    crate::{
        error::{FlatError, FlatResult},
        serialization::ENTRY_SOURCE_SIZE,
        string_pool::StringPoolRef,
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::io::{Read, Write},
};

/// Defining file, line and optional comment of a resource entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntrySource {
    /// File path reference.
    pub path: StringPoolRef,

    /// Line number the resource was defined on.
    pub line: u32,

    /// Comment string reference.
    pub comment: Option<StringPoolRef>,
}

impl EntrySource {
    /// Read a record from a reader.
    ///
    /// `offset` is the location of the record and is only used for error reporting.
    pub fn read_from<R: Read>(reader: &mut R, offset: usize) -> FlatResult<Self> {
        let truncated = |_: std::io::Error| FlatError::TruncatedOrInvalidChunk {
            offset,
            reason: "source record truncated",
        };

        let path = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let line = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let comment = reader.read_u32::<LittleEndian>().map_err(truncated)?;

        Ok(Self {
            path: path.into(),
            line,
            comment: StringPoolRef::from_optional(comment),
        })
    }

    /// Parse a record at the start of a slice.
    pub fn parse(data: &[u8]) -> FlatResult<Self> {
        Self::read_from(&mut &data[..], 0)
    }

    /// Ensure the record can be written without altering any field.
    ///
    /// A present comment must not hold the sentinel index, which would read
    /// back as an absent comment.
    pub fn check(&self) -> FlatResult<()> {
        match self.comment {
            Some(comment) if comment.is_none() => Err(FlatError::InvalidEntryRecord(
                "present source comment holds the absent sentinel",
            )),
            _ => Ok(()),
        }
    }

    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        self.check()?;

        dest.write_u32::<LittleEndian>(self.path.into())?;
        dest.write_u32::<LittleEndian>(self.line)?;
        dest.write_u32::<LittleEndian>(StringPoolRef::optional_index(self.comment))?;

        Ok(())
    }

    pub fn to_bytes(&self) -> FlatResult<[u8; ENTRY_SOURCE_SIZE]> {
        let mut data = [0u8; ENTRY_SOURCE_SIZE];
        self.write_to(&mut &mut data[..])?;

        Ok(data)
    }
}
