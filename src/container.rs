//! Splitting and joining the byte regions of an encrypted container
//!
//! ```text
//! [ header (148) | ciphertext (n) | tag (16) ]
//! ```

use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::format::{HEADER_SIZE, Header, TAG_SIZE};

/// Borrowed views into a container.
#[derive(Debug)]
pub struct Parts<'a> {
    pub header: Header,
    pub ciphertext: &'a [u8],
    pub tag: [u8; TAG_SIZE],
}

/// Number of bytes needed to hold the container for `plaintext_len` bytes.
pub const fn encrypted_len(plaintext_len: usize) -> usize {
    HEADER_SIZE + plaintext_len + TAG_SIZE
}

/// Number of plaintext bytes held by a container of `ciphertext_len` bytes.
///
/// Returns `None` when the container is too short to be valid.
pub const fn decrypted_len(ciphertext_len: usize) -> Option<usize> {
    ciphertext_len.checked_sub(HEADER_SIZE + TAG_SIZE)
}

/// Concatenates the three regions into `out`, which must be exactly
/// [`encrypted_len`] of the ciphertext length.
pub fn assemble_into(
    out: &mut [u8],
    header: &Header,
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<()> {
    check_len(out.len(), encrypted_len(ciphertext.len()))?;

    let (head, rest) = out.split_at_mut(HEADER_SIZE);
    let (body, tail) = rest.split_at_mut(ciphertext.len());
    head.copy_from_slice(&header.to_bytes());
    body.copy_from_slice(ciphertext);
    tail.copy_from_slice(tag);
    Ok(())
}

/// Concatenates the three regions into a fresh buffer.
pub fn assemble(header: &Header, ciphertext: &[u8], tag: &[u8; TAG_SIZE]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encrypted_len(ciphertext.len()));
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(tag);
    out
}

/// Parses the header and splits off the ciphertext and tag.
///
/// Only the structure is checked; neither MAC is verified here.
pub fn disassemble(data: &[u8]) -> Result<Parts<'_>> {
    let header = Header::parse(data)?;
    let body_len = decrypted_len(data.len()).ok_or(ErrorKind::InvalidLength)?;

    let (ciphertext, tail) = data[HEADER_SIZE..].split_at(body_len);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(tail);

    Ok(Parts {
        header,
        ciphertext,
        tag,
    })
}

/// Checks that a caller-provided output buffer has exactly the expected size.
pub(crate) fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(AbcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::General,
            format!("output buffer is {actual} bytes, expected {expected}"),
        ));
    }
    Ok(())
}
