// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Flat Resources

This crate defines and implements the chunk types a resource compiler uses
to carry intermediate artifacts between its compile and link stages. We call
a buffer of these chunks a *flat resources container*.

The chunk types extend the chunk framing of the Android resource table
format. Every chunk begins with an 8 byte envelope holding a type tag, the
size of its header and its total size. This crate adds the following types:

* File exports (`0x000c`). An entire compiled file with its name,
  configuration, source path and the symbols it exports.
* Public tables (`0x000d`). The visibility of the entries of a resource type.
* Source pools (`0x000e`). The string pool referenced by source records.
* Symbol tables (`0x000f`). Offsets in a resource table referencing symbols
  defined elsewhere.

Alongside these, [EntrySource] records capture where a resource entry was
defined and [EntryRecord] gives resource entries an explicit simple/complex
shape.

Known chunk types are validated strictly: magic values, reserved fields and
array counts must all be consistent or decoding fails. Unknown chunk types are
never an error. They are passed through as [RawChunk] so a container can be
read and rewritten without loss.

Strings are never embedded in records. Records hold [StringPoolRef] indices
into a string pool, which callers resolve through [StringPoolResolver].
*/

mod chunk;
mod container;
mod entry;
mod error;
mod file_export;
mod parser;
mod public_table;
mod resource_config;
mod serialization;
mod settings;
mod source;
mod source_pool;
mod string_pool;
mod symbol_table;
mod writer;

pub use crate::{
    chunk::{read_chunk_header, ChunkEnvelope, ChunkHeader, FlatChunk},
    container::{Chunk, RawChunk},
    entry::{EntryRecord, ResourceEntry, ResourceEntryExt, SourcedEntry},
    error::{FlatError, FlatResult},
    file_export::{ExportedSymbol, FileExport},
    parser::{decode_chunks_parallel, load_chunks, read_chunks, scan_chunks, ChunkParserIterator},
    public_table::{PublicEntry, PublicTable},
    resource_config::{ResourceConfig, RESOURCE_CONFIG_SIZE},
    serialization::{
        ChunkType, EntryState, CHUNK_HEADER_SIZE, FILE_EXPORT_MAGIC, FLAG_COMPLEX, FLAG_PUBLIC,
        FLAG_WEAK, NO_INDEX, TYPE_RAW_STRING,
    },
    settings::{ChunkErrorPolicy, ReaderSettings},
    source::EntrySource,
    source_pool::SourcePool,
    string_pool::{StringPoolRef, StringPoolResolver},
    symbol_table::{SymbolTable, SymbolTableEntry},
    writer::{chunks_to_bytes, write_chunks},
};
