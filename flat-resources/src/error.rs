// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
///
/// Every variant describes a hard failure for the chunk being processed.
/// There is no notion of a recoverable field: if a value can't be
/// represented faithfully, decoding of that chunk stops.
#[derive(Debug, Error)]
pub enum FlatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated or invalid chunk at offset {offset}: {reason}")]
    TruncatedOrInvalidChunk { offset: usize, reason: &'static str },

    #[error("unexpected chunk type {actual:#06x}; expected {expected:#06x}")]
    UnexpectedChunkType { expected: u16, actual: u16 },

    #[error("bad magic value in file export header: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("reserved field {field} must be zero; got {value:#x}")]
    ReservedFieldViolation { field: &'static str, value: u32 },

    #[error("invalid public entry state: {0}")]
    InvalidEntryState(u16),

    #[error("public entry id {0:#06x} appears more than once")]
    DuplicateEntryId(u16),

    #[error("exported symbol list truncated: {expected} symbols declared; room for {available}")]
    TruncatedSymbolList { expected: usize, available: usize },

    #[error("entry list truncated: {expected} entries declared; room for {available}")]
    TruncatedEntryList { expected: usize, available: usize },

    #[error("invalid configuration descriptor size: {0}")]
    InvalidConfigSize(u32),

    #[error("invalid entry record: {0}")]
    InvalidEntryRecord(&'static str),

    #[error("declared chunk size {declared} does not match serialized size {actual}")]
    SizeMismatchOnEncode { declared: usize, actual: usize },

    #[error("{0} does not fit in its wire field")]
    SizeOverflow(&'static str),

    #[error("string pool reference {0} could not be resolved")]
    UnresolvedReference(u32),

    #[error("chunk {chunk_type:#06x} at offset {offset}: {source}")]
    Chunk {
        offset: usize,
        chunk_type: u16,
        source: Box<FlatError>,
    },
}

impl FlatError {
    /// Attach the location of the enclosing chunk to this error.
    pub fn in_chunk(self, offset: usize, chunk_type: u16) -> Self {
        Self::Chunk {
            offset,
            chunk_type,
            source: Box::new(self),
        }
    }

    /// Obtain the innermost error, unwrapping any chunk location context.
    pub fn root(&self) -> &FlatError {
        match self {
            Self::Chunk { source, .. } => source.root(),
            _ => self,
        }
    }
}

/// Result type for this crate.
pub type FlatResult<T> = std::result::Result<T, FlatError>;
