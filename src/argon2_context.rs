//! Argon2 type and version selectors stored in the header

use std::fmt;

use argon2::Algorithm;

use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::format::Header;

/// Argon2 type as stored in the header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum Variant {
    /// Argon2d.
    Argon2d = 0,

    /// Argon2i.
    Argon2i = 1,

    /// Argon2id.
    #[default]
    Argon2id = 2,
}

impl From<Variant> for u32 {
    fn from(variant: Variant) -> Self {
        variant as Self
    }
}

impl TryFrom<u32> for Variant {
    type Error = AbcryptError;

    fn try_from(variant: u32) -> Result<Self> {
        match variant {
            0 => Ok(Self::Argon2d),
            1 => Ok(Self::Argon2i),
            2 => Ok(Self::Argon2id),
            v => Err(AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidArgon2Type,
                format!("invalid Argon2 type `{v}`"),
            )),
        }
    }
}

impl From<Variant> for Algorithm {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Argon2d => Self::Argon2d,
            Variant::Argon2i => Self::Argon2i,
            Variant::Argon2id => Self::Argon2id,
        }
    }
}

impl From<Algorithm> for Variant {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Argon2d => Self::Argon2d,
            Algorithm::Argon2i => Self::Argon2i,
            Algorithm::Argon2id => Self::Argon2id,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Argon2d => "Argon2d",
            Self::Argon2i => "Argon2i",
            Self::Argon2id => "Argon2id",
        };
        f.write_str(name)
    }
}

/// Argon2 version as stored in the header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum Version {
    /// Version 0x10.
    V0x10 = 0x10,

    /// Version 0x13.
    #[default]
    V0x13 = 0x13,
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        version as Self
    }
}

impl TryFrom<u32> for Version {
    type Error = AbcryptError;

    fn try_from(version: u32) -> Result<Self> {
        match version {
            0x10 => Ok(Self::V0x10),
            0x13 => Ok(Self::V0x13),
            v => Err(AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidArgon2Version,
                format!("invalid Argon2 version `{v:#x}`"),
            )),
        }
    }
}

impl From<Version> for argon2::Version {
    fn from(version: Version) -> Self {
        match version {
            Version::V0x10 => Self::V0x10,
            Version::V0x13 => Self::V0x13,
        }
    }
}

impl From<argon2::Version> for Version {
    fn from(version: argon2::Version) -> Self {
        match version {
            argon2::Version::V0x10 => Self::V0x10,
            argon2::Version::V0x13 => Self::V0x13,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", u32::from(*self))
    }
}

/// The Argon2 type and version recorded in an encrypted container.
///
/// Like [`crate::params::Params`], this only reads the header and needs no
/// passphrase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Argon2Context {
    variant: Variant,
    version: Version,
}

impl Argon2Context {
    /// Reads the Argon2 context from the header of `ciphertext`.
    ///
    /// Fails with the same structural errors as [`Header::parse`].
    pub fn new(ciphertext: &[u8]) -> Result<Self> {
        let header = Header::parse(ciphertext)?;
        Ok(Self {
            variant: header.variant(),
            version: header.argon2_version(),
        })
    }

    pub const fn variant(&self) -> Variant {
        self.variant
    }

    pub const fn version(&self) -> Version {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_numbers() {
        assert_eq!(u32::from(Variant::Argon2d), 0);
        assert_eq!(u32::from(Variant::Argon2i), 1);
        assert_eq!(u32::from(Variant::Argon2id), 2);
        assert_eq!(Variant::default(), Variant::Argon2id);
    }

    #[test]
    fn test_variant_from_u32() {
        assert_eq!(Variant::try_from(0).unwrap(), Variant::Argon2d);
        assert_eq!(Variant::try_from(1).unwrap(), Variant::Argon2i);
        assert_eq!(Variant::try_from(2).unwrap(), Variant::Argon2id);

        let err = Variant::try_from(3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgon2Type);
        let err = Variant::try_from(u32::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgon2Type);
    }

    #[test]
    fn test_version_from_u32() {
        assert_eq!(Version::try_from(0x10).unwrap(), Version::V0x10);
        assert_eq!(Version::try_from(0x13).unwrap(), Version::V0x13);

        let err = Version::try_from(0x12).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgon2Version);
        assert_eq!(err.to_string(), "invalid Argon2 version `0x12`");
    }

    #[test]
    fn test_argon2_crate_conversions() {
        for variant in [Variant::Argon2d, Variant::Argon2i, Variant::Argon2id] {
            assert_eq!(Variant::from(Algorithm::from(variant)), variant);
        }
        for version in [Version::V0x10, Version::V0x13] {
            assert_eq!(Version::from(argon2::Version::from(version)), version);
        }
        assert_eq!(Variant::from(Algorithm::default()), Variant::default());
        assert_eq!(Version::from(argon2::Version::default()), Version::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Variant::Argon2id.to_string(), "Argon2id");
        assert_eq!(Version::V0x10.to_string(), "0x10");
        assert_eq!(Version::V0x13.to_string(), "0x13");
    }
}
