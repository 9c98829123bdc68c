// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Opaque resource configuration descriptors.

The configuration descriptor (device, locale, density and other axes) is
defined by the resource table format. We don't interpret it. All we rely on
is that its first `u32` is the byte length of the whole descriptor, which is
what allows the descriptor to grow across format versions.
*/

use {
    crate::error::{FlatError, FlatResult},
    byteorder::{ByteOrder, LittleEndian},
    std::{borrow::Cow, io::Write},
};

/// Size of the descriptor written by current resource compilers.
pub const RESOURCE_CONFIG_SIZE: usize = 64;

/// A configuration descriptor, carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceConfig<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> ResourceConfig<'a> {
    /// The default configuration, matching any device.
    pub fn any() -> ResourceConfig<'static> {
        let mut data = vec![0u8; RESOURCE_CONFIG_SIZE];
        LittleEndian::write_u32(&mut data[0..4], RESOURCE_CONFIG_SIZE as u32);

        ResourceConfig {
            data: Cow::Owned(data),
        }
    }

    /// Construct an instance from raw descriptor bytes.
    ///
    /// The embedded size field must agree with the length of `data`.
    pub fn from_bytes(data: impl Into<Cow<'a, [u8]>>) -> FlatResult<Self> {
        let data = data.into();

        if data.len() < 4 {
            return Err(FlatError::InvalidConfigSize(data.len() as u32));
        }

        let declared = LittleEndian::read_u32(&data[0..4]);

        if declared as usize != data.len() {
            return Err(FlatError::SizeMismatchOnEncode {
                declared: declared as usize,
                actual: data.len(),
            });
        }

        Ok(Self { data })
    }

    /// Read a descriptor from the start of `data`.
    ///
    /// Returns the descriptor borrowing from `data`.
    pub fn parse(data: &'a [u8]) -> FlatResult<Self> {
        if data.len() < 4 {
            return Err(FlatError::InvalidConfigSize(data.len() as u32));
        }

        let size = LittleEndian::read_u32(&data[0..4]);

        if size < 4 || size as usize > data.len() {
            return Err(FlatError::InvalidConfigSize(size));
        }

        Ok(Self {
            data: Cow::Borrowed(&data[0..size as usize]),
        })
    }

    /// Size of the serialized descriptor.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn write_to<W: Write>(&self, dest: &mut W) -> FlatResult<()> {
        dest.write_all(&self.data)?;

        Ok(())
    }

    pub fn into_owned(self) -> ResourceConfig<'static> {
        ResourceConfig {
            data: Cow::Owned(self.data.into_owned()),
        }
    }
}

impl Default for ResourceConfig<'static> {
    fn default() -> Self {
        Self::any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any() {
        let config = ResourceConfig::any();
        assert_eq!(config.len(), RESOURCE_CONFIG_SIZE);
        assert_eq!(&config.as_bytes()[0..4], b"\x40\x00\x00\x00");
        assert!(config.as_bytes()[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn parse_uses_embedded_size() {
        let data = b"\x08\x00\x00\x00\x01\x02\x03\x04\xff\xff";
        let config = ResourceConfig::parse(data).unwrap();

        assert_eq!(config.len(), 8);
        assert_eq!(config.as_bytes(), &data[0..8]);
    }

    #[test]
    fn parse_invalid_size() {
        assert!(matches!(
            ResourceConfig::parse(b"\x08\x00"),
            Err(FlatError::InvalidConfigSize(2))
        ));
        assert!(matches!(
            ResourceConfig::parse(b"\x02\x00\x00\x00"),
            Err(FlatError::InvalidConfigSize(2))
        ));
        assert!(matches!(
            ResourceConfig::parse(b"\x09\x00\x00\x00\x00\x00\x00\x00"),
            Err(FlatError::InvalidConfigSize(9))
        ));
    }

    #[test]
    fn from_bytes_checks_size() {
        assert!(ResourceConfig::from_bytes(b"\x04\x00\x00\x00".to_vec()).is_ok());
        assert!(matches!(
            ResourceConfig::from_bytes(b"\x08\x00\x00\x00".to_vec()),
            Err(FlatError::SizeMismatchOnEncode {
                declared: 8,
                actual: 4
            })
        ));
    }
}
