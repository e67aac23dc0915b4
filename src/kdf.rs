//! Key derivation: Argon2(passphrase, salt) → payload key + header MAC key
//!
//! A single Argon2 invocation produces 96 bytes. The first 32 bytes key
//! XChaCha20-Poly1305, the last 64 bytes key BLAKE2b-512-MAC.

use std::fmt;

use argon2::Argon2;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::argon2_context::{Variant, Version};
use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::format::{MAC_LEN, SALT_LEN};
use crate::params::Params;

/// Length of the payload encryption key in bytes.
pub const ENCRYPT_KEY_LEN: usize = 32;

/// Length of the Argon2 output in bytes.
pub const DERIVED_KEY_LEN: usize = ENCRYPT_KEY_LEN + MAC_LEN;

/// The keys derived from a passphrase for one container.
///
/// Zeroized on drop, including on early error returns.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    encrypt: [u8; ENCRYPT_KEY_LEN],
    mac: [u8; MAC_LEN],
}

impl DerivedKey {
    fn from_bytes(dk: &[u8; DERIVED_KEY_LEN]) -> Self {
        let mut encrypt = [0u8; ENCRYPT_KEY_LEN];
        encrypt.copy_from_slice(&dk[..ENCRYPT_KEY_LEN]);
        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&dk[ENCRYPT_KEY_LEN..]);
        Self { encrypt, mac }
    }

    /// The XChaCha20-Poly1305 key.
    pub const fn encrypt(&self) -> &[u8; ENCRYPT_KEY_LEN] {
        &self.encrypt
    }

    /// The BLAKE2b-512-MAC key.
    pub const fn mac(&self) -> &[u8; MAC_LEN] {
        &self.mac
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("encrypt", &"[REDACTED]")
            .field("mac", &"[REDACTED]")
            .finish()
    }
}

/// Derive the payload and header keys from a passphrase.
///
/// The passphrase is only borrowed; wiping it is the caller's job.
pub fn derive_keys(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    variant: Variant,
    version: Version,
    params: Params,
) -> Result<DerivedKey> {
    let argon2 = Argon2::new(variant.into(), version.into(), params.try_into()?);

    tracing::debug!(
        argon2_type = %variant,
        argon2_version = %version,
        memory_cost = params.memory_cost(),
        time_cost = params.time_cost(),
        parallelism = params.parallelism(),
        "deriving keys"
    );

    let mut dk = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, &mut dk[..])
        .map_err(|e| {
            AbcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InvalidArgon2Context,
                "invalid Argon2 context",
                e,
            )
        })?;

    Ok(DerivedKey::from_bytes(&dk))
}
