//! Header authentication with BLAKE2b-512-MAC
//!
//! The header MAC is keyed by a subkey derived from the passphrase, so a
//! mismatch is how an incorrect passphrase is detected. It is checked
//! before any payload decryption.

use blake2::Blake2bMac512;
use blake2::digest::{Key, Mac};

use crate::error::{AbcryptError, ErrorKind, Result};
use crate::format::MAC_LEN;

fn keyed(key: &[u8; MAC_LEN]) -> Blake2bMac512 {
    <Blake2bMac512 as Mac>::new(Key::<Blake2bMac512>::from_slice(key))
}

/// Compute the MAC over the header bytes preceding the MAC field.
pub fn sign_header(header: &[u8], key: &[u8; MAC_LEN]) -> [u8; MAC_LEN] {
    let mut mac = keyed(key);
    mac.update(header);

    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Verify `tag` over `header` in constant time.
pub fn verify_header(header: &[u8], tag: &[u8; MAC_LEN], key: &[u8; MAC_LEN]) -> Result<()> {
    let mut mac = keyed(key);
    mac.update(header);
    mac.verify_slice(tag)
        .map_err(|_| AbcryptError::from(ErrorKind::InvalidHeaderMac))
}
