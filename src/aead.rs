//! Payload encryption with XChaCha20-Poly1305
//!
//! The tag is kept detached so the ciphertext can be written in place
//! between the header and the tag. No associated data is used: the header
//! is bound by its own MAC.

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{Key, Tag, XChaCha20Poly1305, XNonce};
use zeroize::Zeroize;

use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::format::{NONCE_LEN, TAG_SIZE};
use crate::kdf::ENCRYPT_KEY_LEN;

const AAD: &[u8] = &[];

/// Encrypt `buf` in place and return the authentication tag.
pub fn seal_in_place(
    buf: &mut [u8],
    key: &[u8; ENCRYPT_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<[u8; TAG_SIZE]> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(nonce), AAD, buf)
        .map_err(|_| {
            AbcryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::General,
                "payload too long to encrypt",
            )
        })?;

    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Verify `tag` and decrypt `buf` in place.
///
/// On failure `buf` is wiped; no unauthenticated plaintext is ever left
/// behind.
pub fn open_in_place(
    buf: &mut [u8],
    tag: &[u8; TAG_SIZE],
    key: &[u8; ENCRYPT_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<()> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let opened =
        cipher.decrypt_in_place_detached(XNonce::from_slice(nonce), AAD, buf, Tag::from_slice(tag));
    if opened.is_err() {
        buf.zeroize();
        return Err(AbcryptError::from(ErrorKind::InvalidMac));
    }
    Ok(())
}

/// Encrypt `plaintext`, returning the ciphertext (same length) and the tag.
pub fn seal(
    plaintext: &[u8],
    key: &[u8; ENCRYPT_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<(Vec<u8>, [u8; TAG_SIZE])> {
    let mut buf = plaintext.to_vec();
    let tag = seal_in_place(&mut buf, key, nonce)?;
    Ok((buf, tag))
}

/// Verify and decrypt `ciphertext`.
pub fn open(
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
    key: &[u8; ENCRYPT_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let mut buf = ciphertext.to_vec();
    open_in_place(&mut buf, tag, key, nonce)?;
    Ok(buf)
}
