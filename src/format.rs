//! Header codec for the abcrypt encrypted data format
//!
//! All integers are little-endian. The header layout is:
//!
//! ```text
//! offset  size  field
//!      0     7  magic number ("abcrypt")
//!      7     1  format version (1)
//!      8     4  Argon2 type (0 = Argon2d, 1 = Argon2i, 2 = Argon2id)
//!     12     4  Argon2 version (0x10 or 0x13)
//!     16     4  memory cost in KiB
//!     20     4  time cost
//!     24     4  parallelism
//!     28    32  salt
//!     60    24  XChaCha20 nonce
//!     84    64  BLAKE2b-512-MAC over bytes 0..84
//! ```
//!
//! A container is the header followed by the ciphertext and a 16-byte
//! Poly1305 tag.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::argon2_context::{Variant, Version as Argon2Version};
use crate::authenticator;
use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::params::Params;

/// Magic number of the format, the ASCII code for "abcrypt".
pub const MAGIC_NUMBER: [u8; 7] = *b"abcrypt";

/// Length of the Argon2 salt in bytes.
pub const SALT_LEN: usize = 32;

/// Length of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Length of the header MAC in bytes.
pub const MAC_LEN: usize = 64;

/// Offset of the header MAC; everything before it is authenticated.
pub const MAC_OFFSET: usize = 84;

/// The number of bytes of the header.
pub const HEADER_SIZE: usize = MAC_OFFSET + MAC_LEN;

/// The number of bytes of the payload authentication tag.
pub const TAG_SIZE: usize = 16;

const VERSION_OFFSET: usize = 7;
const ARGON2_TYPE_OFFSET: usize = 8;
const ARGON2_VERSION_OFFSET: usize = 12;
const MEMORY_COST_OFFSET: usize = 16;
const TIME_COST_OFFSET: usize = 20;
const PARALLELISM_OFFSET: usize = 24;
const SALT_OFFSET: usize = 28;
const NONCE_OFFSET: usize = SALT_OFFSET + SALT_LEN;

/// Format version numbers.
///
/// Version 0 is recognized but no longer accepted: its header predates the
/// Argon2 type and version fields. Any other number is unknown.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Version {
    /// Version 0.
    V0,

    /// Version 1.
    #[default]
    V1,
}

impl Version {
    /// The version this crate reads and writes.
    pub const CURRENT: Self = Self::V1;
}

impl From<Version> for u8 {
    fn from(version: Version) -> Self {
        match version {
            Version::V0 => 0,
            Version::V1 => 1,
        }
    }
}

impl TryFrom<u8> for Version {
    type Error = AbcryptError;

    fn try_from(version: u8) -> Result<Self> {
        match version {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            v => Err(AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnknownVersion,
                format!("unknown version number `{v}`"),
            )),
        }
    }
}

/// Parsed or freshly built container header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    version: Version,
    variant: Variant,
    argon2_version: Argon2Version,
    params: Params,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    mac: [u8; MAC_LEN],
}

impl Header {
    /// Builds an unsigned header from caller-supplied salt and nonce.
    ///
    /// The salt and nonce must be freshly generated for every encryption;
    /// see [`Header::generate`].
    pub fn new(
        variant: Variant,
        argon2_version: Argon2Version,
        params: Params,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
    ) -> Self {
        Self {
            version: Version::CURRENT,
            variant,
            argon2_version,
            params,
            salt,
            nonce,
            mac: [0u8; MAC_LEN],
        }
    }

    /// Builds an unsigned header with a random salt and nonce.
    pub fn generate(variant: Variant, argon2_version: Argon2Version, params: Params) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        Self::new(variant, argon2_version, params, salt, nonce)
    }

    /// Parses the header at the start of `data`.
    ///
    /// `data` is the whole container, so anything shorter than the header
    /// plus the payload tag is rejected. This is a purely structural check:
    /// the MAC is read but not verified.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + TAG_SIZE {
            return Err(AbcryptError::from(ErrorKind::InvalidLength));
        }

        if data[..MAGIC_NUMBER.len()] != MAGIC_NUMBER {
            return Err(AbcryptError::from(ErrorKind::InvalidMagicNumber));
        }

        let version = Version::try_from(data[VERSION_OFFSET])?;
        if version != Version::CURRENT {
            return Err(AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnsupportedVersion,
                format!("unsupported version number `{}`", u8::from(version)),
            ));
        }

        let variant = Variant::try_from(read_u32(data, ARGON2_TYPE_OFFSET))?;
        let argon2_version = Argon2Version::try_from(read_u32(data, ARGON2_VERSION_OFFSET))?;
        let params = Params::from_costs(
            read_u32(data, MEMORY_COST_OFFSET),
            read_u32(data, TIME_COST_OFFSET),
            read_u32(data, PARALLELISM_OFFSET),
        )?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[SALT_OFFSET..NONCE_OFFSET]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[NONCE_OFFSET..MAC_OFFSET]);
        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&data[MAC_OFFSET..HEADER_SIZE]);

        Ok(Self {
            version,
            variant,
            argon2_version,
            params,
            salt,
            nonce,
            mac,
        })
    }

    /// Computes the header MAC with `key` and stores it in the header.
    pub fn sign(&mut self, key: &[u8; MAC_LEN]) {
        self.mac = authenticator::sign_header(&self.authenticated_bytes(), key);
    }

    /// Verifies the stored header MAC against `key`.
    pub fn verify(&self, key: &[u8; MAC_LEN]) -> Result<()> {
        authenticator::verify_header(&self.authenticated_bytes(), &self.mac, key)
    }

    /// The bytes covered by the header MAC.
    pub fn authenticated_bytes(&self) -> [u8; MAC_OFFSET] {
        let mut header = [0u8; MAC_OFFSET];
        header[..VERSION_OFFSET].copy_from_slice(&MAGIC_NUMBER);
        header[VERSION_OFFSET] = self.version.into();
        write_u32(&mut header, ARGON2_TYPE_OFFSET, self.variant.into());
        write_u32(&mut header, ARGON2_VERSION_OFFSET, self.argon2_version.into());
        write_u32(&mut header, MEMORY_COST_OFFSET, self.params.memory_cost());
        write_u32(&mut header, TIME_COST_OFFSET, self.params.time_cost());
        write_u32(&mut header, PARALLELISM_OFFSET, self.params.parallelism());
        header[SALT_OFFSET..NONCE_OFFSET].copy_from_slice(&self.salt);
        header[NONCE_OFFSET..].copy_from_slice(&self.nonce);
        header
    }

    /// Serializes the header, MAC included, to its on-wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[..MAC_OFFSET].copy_from_slice(&self.authenticated_bytes());
        header[MAC_OFFSET..].copy_from_slice(&self.mac);
        header
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn variant(&self) -> Variant {
        self.variant
    }

    pub const fn argon2_version(&self) -> Argon2Version {
        self.argon2_version
    }

    /// Returns the Argon2 parameters stored in this header.
    pub const fn params(&self) -> Params {
        self.params
    }

    pub const fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub const fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub const fn mac(&self) -> &[u8; MAC_LEN] {
        &self.mac
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
