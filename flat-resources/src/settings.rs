// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Settings influencing how containers are read. */

/// What a container reader does after a chunk fails to decode.
///
/// Skipping is only possible when the chunk envelope itself was valid. A bad
/// envelope always ends reading because there is no trustworthy size to skip by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkErrorPolicy {
    /// Emit the error and stop reading.
    Abort,
    /// Emit the error and continue with the next chunk.
    Skip,
}

impl Default for ChunkErrorPolicy {
    fn default() -> Self {
        Self::Abort
    }
}

/// Represents settings for reading flat resource containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderSettings {
    chunk_error_policy: ChunkErrorPolicy,
    allow_extended_headers: bool,
    entry_source_trailer: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            chunk_error_policy: ChunkErrorPolicy::default(),
            allow_extended_headers: true,
            entry_source_trailer: false,
        }
    }
}

impl ReaderSettings {
    pub fn chunk_error_policy(&self) -> ChunkErrorPolicy {
        self.chunk_error_policy
    }

    pub fn set_chunk_error_policy(&mut self, policy: ChunkErrorPolicy) {
        self.chunk_error_policy = policy;
    }

    /// Whether chunk headers larger than the known fixed header are accepted.
    ///
    /// Newer writers may append fields to a header. When allowed, the extra
    /// bytes are ignored and the body is located via `header_size`.
    pub fn allow_extended_headers(&self) -> bool {
        self.allow_extended_headers
    }

    pub fn set_allow_extended_headers(&mut self, value: bool) {
        self.allow_extended_headers = value;
    }

    /// Whether resource entry records are followed by a source provenance record.
    pub fn entry_source_trailer(&self) -> bool {
        self.entry_source_trailer
    }

    pub fn set_entry_source_trailer(&mut self, value: bool) {
        self.entry_source_trailer = value;
    }

    /// Builder variant of [Self::set_chunk_error_policy].
    pub fn with_chunk_error_policy(mut self, policy: ChunkErrorPolicy) -> Self {
        self.set_chunk_error_policy(policy);
        self
    }

    /// Builder variant of [Self::set_allow_extended_headers].
    pub fn with_allow_extended_headers(mut self, value: bool) -> Self {
        self.set_allow_extended_headers(value);
        self
    }

    /// Builder variant of [Self::set_entry_source_trailer].
    pub fn with_entry_source_trailer(mut self, value: bool) -> Self {
        self.set_entry_source_trailer(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ReaderSettings::default();

        assert_eq!(settings.chunk_error_policy(), ChunkErrorPolicy::Abort);
        assert!(settings.allow_extended_headers());
        assert!(!settings.entry_source_trailer());
    }
}
