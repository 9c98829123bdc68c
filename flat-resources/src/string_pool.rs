// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! String pool references.

Records in flat resource chunks never embed strings. Instead they hold
indices into the nearest enclosing string pool. The pool itself is owned by
the enclosing chunk or container and is resolved by the caller through
[StringPoolResolver].
*/

use {crate::serialization::NO_INDEX, std::borrow::Cow};

/// A non-owning index into a string pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringPoolRef(u32);

impl StringPoolRef {
    /// The sentinel reference denoting no string.
    pub const NONE: StringPoolRef = StringPoolRef(NO_INDEX);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw index value as stored on the wire.
    pub const fn index(&self) -> u32 {
        self.0
    }

    pub const fn is_none(&self) -> bool {
        self.0 == NO_INDEX
    }

    /// Interpret a raw wire value, mapping the sentinel to `None`.
    pub fn from_optional(index: u32) -> Option<Self> {
        if index == NO_INDEX {
            None
        } else {
            Some(Self(index))
        }
    }

    /// Obtain the raw wire value of an optional reference.
    pub fn optional_index(reference: Option<Self>) -> u32 {
        reference.map_or(NO_INDEX, |r| r.0)
    }
}

impl From<u32> for StringPoolRef {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<StringPoolRef> for u32 {
    fn from(v: StringPoolRef) -> Self {
        v.0
    }
}

/// Resolves string pool references into string values.
///
/// Parsing a string pool is the responsibility of the resource table
/// layer. This trait is the seam through which that layer is plugged in.
pub trait StringPoolResolver {
    /// Resolve a reference, returning `None` if it is out of range.
    fn resolve(&self, reference: StringPoolRef) -> Option<Cow<'_, str>>;
}

impl<S: AsRef<str>> StringPoolResolver for [S] {
    fn resolve(&self, reference: StringPoolRef) -> Option<Cow<'_, str>> {
        if reference.is_none() {
            return None;
        }

        self.get(reference.index() as usize)
            .map(|s| Cow::Borrowed(s.as_ref()))
    }
}

impl<S: AsRef<str>> StringPoolResolver for Vec<S> {
    fn resolve(&self, reference: StringPoolRef) -> Option<Cow<'_, str>> {
        self.as_slice().resolve(reference)
    }
}
