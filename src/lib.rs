//! abcrypt - Passphrase-based encryption using the abcrypt encrypted data format
//!
//! A container is a 148-byte header (Argon2 settings, salt, nonce, and a
//! BLAKE2b-512-MAC over all of these) followed by the XChaCha20-Poly1305
//! ciphertext and its 16-byte tag.
//!
//! ```no_run
//! let ciphertext = abcrypt::encrypt(b"hello", b"passphrase")?;
//! assert_eq!(ciphertext.len(), 5 + abcrypt::HEADER_SIZE + abcrypt::TAG_SIZE);
//! let plaintext = abcrypt::decrypt(&ciphertext, b"passphrase")?;
//! assert_eq!(plaintext, b"hello");
//! # Ok::<(), abcrypt::error::AbcryptError>(())
//! ```

#![cfg_attr(not(feature = "capi"), forbid(unsafe_code))]
#![cfg_attr(feature = "capi", deny(unsafe_code))]

pub mod aead;
pub mod argon2_context;
pub mod authenticator;
pub mod container;
pub mod error;
#[cfg(feature = "capi")]
#[allow(unsafe_code)]
pub mod ffi;
pub mod file_ops;
pub mod format;
pub mod kdf;
pub mod params;
pub mod passphrase;
pub mod secretcrypt;

pub use argon2_context::Argon2Context;
pub use error::{AbcryptError, ErrorKind};
pub use format::{HEADER_SIZE, TAG_SIZE};
pub use params::{Params, read_params};
pub use secretcrypt::{
    Decryptor, Encryptor, decrypt, encrypt, encrypt_deterministic, encrypt_with_context,
    encrypt_with_params,
};
