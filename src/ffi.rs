//! C ABI, enabled with the `capi` feature
//!
//! Declarations for C and C++ callers live in `include/abcrypt.h`. All
//! buffers are owned by the caller and are never retained or freed here.
//! Output buffers must be sized exactly: `plaintext_len + 164` for
//! encryption, `ciphertext_len - 164` for decryption.

use std::ptr::NonNull;
use std::slice;

use crate::argon2_context::{Variant, Version};
use crate::error::{AbcryptError, ErrorKind, Result};
use crate::params::Params;
use crate::secretcrypt::{Decryptor, Encryptor};

/// The result of every fallible `abcrypt_*` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum ErrorCode {
    Ok,
    Error,
    InvalidLength,
    InvalidMagicNumber,
    UnsupportedVersion,
    UnknownVersion,
    InvalidArgon2Type,
    InvalidArgon2Version,
    InvalidArgon2Params,
    InvalidArgon2Context,
    InvalidHeaderMac,
    InvalidMac,
}

impl ErrorCode {
    fn message(self) -> &'static str {
        match self {
            Self::Ok => "everything is ok",
            Self::Error => ErrorKind::General.detail(),
            Self::InvalidLength => ErrorKind::InvalidLength.detail(),
            Self::InvalidMagicNumber => ErrorKind::InvalidMagicNumber.detail(),
            Self::UnsupportedVersion => ErrorKind::UnsupportedVersion.detail(),
            Self::UnknownVersion => ErrorKind::UnknownVersion.detail(),
            Self::InvalidArgon2Type => ErrorKind::InvalidArgon2Type.detail(),
            Self::InvalidArgon2Version => ErrorKind::InvalidArgon2Version.detail(),
            Self::InvalidArgon2Params => ErrorKind::InvalidArgon2Params.detail(),
            Self::InvalidArgon2Context => ErrorKind::InvalidArgon2Context.detail(),
            Self::InvalidHeaderMac => ErrorKind::InvalidHeaderMac.detail(),
            Self::InvalidMac => ErrorKind::InvalidMac.detail(),
        }
    }
}

impl From<&AbcryptError> for ErrorCode {
    fn from(err: &AbcryptError) -> Self {
        match err.kind {
            ErrorKind::InvalidLength => Self::InvalidLength,
            ErrorKind::InvalidMagicNumber => Self::InvalidMagicNumber,
            ErrorKind::UnsupportedVersion => Self::UnsupportedVersion,
            ErrorKind::UnknownVersion => Self::UnknownVersion,
            ErrorKind::InvalidArgon2Type => Self::InvalidArgon2Type,
            ErrorKind::InvalidArgon2Version => Self::InvalidArgon2Version,
            ErrorKind::InvalidArgon2Params => Self::InvalidArgon2Params,
            ErrorKind::InvalidArgon2Context => Self::InvalidArgon2Context,
            ErrorKind::InvalidHeaderMac => Self::InvalidHeaderMac,
            ErrorKind::InvalidMac => Self::InvalidMac,
            ErrorKind::PassphraseUnavailable | ErrorKind::Io | ErrorKind::General => Self::Error,
        }
    }
}

impl From<Result<()>> for ErrorCode {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::from(&e),
        }
    }
}

/// # Safety
///
/// `ptr` and `len` must satisfy the conditions of `slice::from_raw_parts`.
unsafe fn borrow<'a>(ptr: Option<NonNull<u8>>, len: usize) -> Option<&'a [u8]> {
    // SAFETY: upheld by the caller.
    ptr.map(|p| unsafe { slice::from_raw_parts(p.as_ptr(), len) })
}

/// # Safety
///
/// `ptr` and `len` must satisfy the conditions of `slice::from_raw_parts_mut`.
unsafe fn borrow_mut<'a>(ptr: Option<NonNull<u8>>, len: usize) -> Option<&'a mut [u8]> {
    // SAFETY: upheld by the caller.
    ptr.map(|p| unsafe { slice::from_raw_parts_mut(p.as_ptr(), len) })
}

#[allow(clippy::too_many_arguments)]
fn encrypt_into(
    plaintext: &[u8],
    passphrase: &[u8],
    out: &mut [u8],
    argon2_type: u32,
    argon2_version: u32,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> Result<()> {
    let variant = Variant::try_from(argon2_type)?;
    let version = Version::try_from(argon2_version)?;
    let params = Params::from_costs(memory_cost, time_cost, parallelism)?;
    Encryptor::with_context(plaintext, passphrase, variant, version, params)?.encrypt(out)
}

/// # Safety
///
/// Each pointer/length pair must satisfy the conditions of
/// `slice::from_raw_parts`, and `out` must not overlap the inputs.
#[allow(clippy::too_many_arguments)]
unsafe fn encrypt_raw(
    plaintext: Option<NonNull<u8>>,
    plaintext_len: usize,
    passphrase: Option<NonNull<u8>>,
    passphrase_len: usize,
    out: Option<NonNull<u8>>,
    out_len: usize,
    argon2_type: u32,
    argon2_version: u32,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    let (plaintext, passphrase, out) = unsafe {
        (
            borrow(plaintext, plaintext_len),
            borrow(passphrase, passphrase_len),
            borrow_mut(out, out_len),
        )
    };
    let (Some(plaintext), Some(passphrase), Some(out)) = (plaintext, passphrase, out) else {
        return ErrorCode::Error;
    };
    encrypt_into(
        plaintext,
        passphrase,
        out,
        argon2_type,
        argon2_version,
        memory_cost,
        time_cost,
        parallelism,
    )
    .into()
}

/// Encrypts `plaintext` with Argon2id, version 0x13 and the default costs.
///
/// # Safety
///
/// Each pointer/length pair must satisfy the conditions of
/// `slice::from_raw_parts`, and `out` must not overlap the inputs.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_encrypt(
    plaintext: Option<NonNull<u8>>,
    plaintext_len: usize,
    passphrase: Option<NonNull<u8>>,
    passphrase_len: usize,
    out: Option<NonNull<u8>>,
    out_len: usize,
) -> ErrorCode {
    let params = Params::default();
    // SAFETY: upheld by the caller.
    unsafe {
        encrypt_raw(
            plaintext,
            plaintext_len,
            passphrase,
            passphrase_len,
            out,
            out_len,
            Variant::default().into(),
            Version::default().into(),
            params.memory_cost(),
            params.time_cost(),
            params.parallelism(),
        )
    }
}

/// Encrypts `plaintext` with Argon2id, version 0x13 and the given costs.
///
/// # Safety
///
/// Each pointer/length pair must satisfy the conditions of
/// `slice::from_raw_parts`, and `out` must not overlap the inputs.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn abcrypt_encrypt_with_params(
    plaintext: Option<NonNull<u8>>,
    plaintext_len: usize,
    passphrase: Option<NonNull<u8>>,
    passphrase_len: usize,
    out: Option<NonNull<u8>>,
    out_len: usize,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    unsafe {
        encrypt_raw(
            plaintext,
            plaintext_len,
            passphrase,
            passphrase_len,
            out,
            out_len,
            Variant::default().into(),
            Version::default().into(),
            memory_cost,
            time_cost,
            parallelism,
        )
    }
}

/// Encrypts `plaintext` with the given Argon2 type, version and costs.
///
/// # Safety
///
/// Each pointer/length pair must satisfy the conditions of
/// `slice::from_raw_parts`, and `out` must not overlap the inputs.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn abcrypt_encrypt_with_context(
    plaintext: Option<NonNull<u8>>,
    plaintext_len: usize,
    passphrase: Option<NonNull<u8>>,
    passphrase_len: usize,
    out: Option<NonNull<u8>>,
    out_len: usize,
    argon2_type: u32,
    argon2_version: u32,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    unsafe {
        encrypt_raw(
            plaintext,
            plaintext_len,
            passphrase,
            passphrase_len,
            out,
            out_len,
            argon2_type,
            argon2_version,
            memory_cost,
            time_cost,
            parallelism,
        )
    }
}

/// Decrypts `ciphertext` into `out`.
///
/// # Safety
///
/// Each pointer/length pair must satisfy the conditions of
/// `slice::from_raw_parts`, and `out` must not overlap the inputs.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_decrypt(
    ciphertext: Option<NonNull<u8>>,
    ciphertext_len: usize,
    passphrase: Option<NonNull<u8>>,
    passphrase_len: usize,
    out: Option<NonNull<u8>>,
    out_len: usize,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    let (ciphertext, passphrase, out) = unsafe {
        (
            borrow(ciphertext, ciphertext_len),
            borrow(passphrase, passphrase_len),
            borrow_mut(out, out_len),
        )
    };
    let (Some(ciphertext), Some(passphrase), Some(out)) = (ciphertext, passphrase, out) else {
        return ErrorCode::Error;
    };
    Decryptor::new(ciphertext, passphrase)
        .and_then(|decryptor| decryptor.decrypt(out))
        .into()
}

/// Writes the NUL-terminated message for `error_code` into `buf`.
///
/// `buf_len` must equal [`abcrypt_error_message_out_len`].
///
/// # Safety
///
/// `buf` and `buf_len` must satisfy the conditions of
/// `slice::from_raw_parts_mut`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_error_message(
    error_code: ErrorCode,
    buf: Option<NonNull<u8>>,
    buf_len: usize,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    let Some(buf) = (unsafe { borrow_mut(buf, buf_len) }) else {
        return ErrorCode::Error;
    };
    let message = error_code.message().as_bytes();
    if buf.len() != message.len() + 1 {
        return ErrorCode::Error;
    }
    let (text, nul) = buf.split_at_mut(message.len());
    text.copy_from_slice(message);
    nul[0] = 0;
    ErrorCode::Ok
}

/// Number of bytes, NUL included, of the message for `error_code`.
#[unsafe(no_mangle)]
pub extern "C" fn abcrypt_error_message_out_len(error_code: ErrorCode) -> usize {
    error_code.message().len() + 1
}

/// Allocates a parameter handle holding the default costs.
///
/// Release it with [`abcrypt_params_free`].
#[unsafe(no_mangle)]
pub extern "C" fn abcrypt_params_new() -> NonNull<Params> {
    NonNull::from(Box::leak(Box::new(Params::default())))
}

/// Frees a handle from [`abcrypt_params_new`]. Null is ignored.
///
/// # Safety
///
/// `params` must come from [`abcrypt_params_new`] and not be freed twice.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_params_free(params: Option<NonNull<Params>>) {
    if let Some(params) = params {
        // SAFETY: upheld by the caller.
        drop(unsafe { Box::from_raw(params.as_ptr()) });
    }
}

/// Reads the costs from the header of `ciphertext` into `params`.
///
/// # Safety
///
/// `ciphertext` and `ciphertext_len` must satisfy the conditions of
/// `slice::from_raw_parts`, and `params` must come from
/// [`abcrypt_params_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_params_read(
    ciphertext: Option<NonNull<u8>>,
    ciphertext_len: usize,
    params: Option<NonNull<Params>>,
) -> ErrorCode {
    // SAFETY: upheld by the caller.
    let Some(ciphertext) = (unsafe { borrow(ciphertext, ciphertext_len) }) else {
        return ErrorCode::Error;
    };
    let Some(mut params) = params else {
        return ErrorCode::Error;
    };
    match Params::new(ciphertext) {
        Ok(read) => {
            // SAFETY: upheld by the caller.
            unsafe { *params.as_mut() = read };
            ErrorCode::Ok
        }
        Err(e) => ErrorCode::from(&e),
    }
}

/// Memory size in KiB, or `0` if `params` is null.
///
/// # Safety
///
/// `params` must be null or come from [`abcrypt_params_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_params_memory_cost(params: Option<NonNull<Params>>) -> u32 {
    // SAFETY: upheld by the caller.
    params.map_or(0, |p| unsafe { p.as_ref() }.memory_cost())
}

/// Number of iterations, or `0` if `params` is null.
///
/// # Safety
///
/// `params` must be null or come from [`abcrypt_params_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_params_time_cost(params: Option<NonNull<Params>>) -> u32 {
    // SAFETY: upheld by the caller.
    params.map_or(0, |p| unsafe { p.as_ref() }.time_cost())
}

/// Degree of parallelism, or `0` if `params` is null.
///
/// # Safety
///
/// `params` must be null or come from [`abcrypt_params_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn abcrypt_params_parallelism(params: Option<NonNull<Params>>) -> u32 {
    // SAFETY: upheld by the caller.
    params.map_or(0, |p| unsafe { p.as_ref() }.parallelism())
}
