//! File encryption/decryption operations
//!
//! This module provides high-level operations for encrypting, decrypting and
//! inspecting abcrypt files. Every input is a file or, when no path is given,
//! stdin; every output is a file or, when no path is given, stdout.

use crate::argon2_context::{Argon2Context, Variant, Version};
use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use crate::params::Params;
use crate::passphrase::PassphraseReader;
use crate::secretcrypt::{self, Decryptor};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use zeroize::Zeroizing;

/// Settings for producing a new container.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EncryptOptions {
    pub variant: Variant,
    pub version: Version,
    pub params: Params,
}

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the container to `output_path`.
///
/// Output files are replaced atomically and created with mode 0o600
/// (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: Option<&Path>,
    output_path: Option<&Path>,
    options: &EncryptOptions,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = Zeroizing::new(read_input(input_path)?);
    let passphrase = passphrase_reader.read_passphrase()?;
    let ciphertext = secretcrypt::encrypt_with_context(
        &plaintext,
        &passphrase,
        options.variant,
        options.version,
        options.params,
    )
    .map_err(|e| e.with_context("the plaintext could not be encrypted"))?;
    write_output(output_path, &ciphertext)
}

/// Decrypt a file with a passphrase
///
/// Reads the container from `input_path`, decrypts it using a passphrase from
/// `passphrase_reader`, and writes the plaintext to `output_path`. Returns
/// the Argon2 parameters the container was encrypted with.
///
/// Output files are replaced atomically and created with mode 0o600
/// (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: Option<&Path>,
    output_path: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<Params> {
    let ciphertext = read_input(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let decryptor = Decryptor::new(&ciphertext, &passphrase).map_err(decrypt_context)?;
    let plaintext = Zeroizing::new(decryptor.decrypt_to_vec().map_err(decrypt_context)?);
    write_output(output_path, &plaintext)?;
    Ok(decryptor.params())
}

/// Read the Argon2 cost parameters of an encrypted file
///
/// Needs no passphrase and does not touch the payload.
pub fn read_info(input_path: Option<&Path>) -> Result<Params> {
    let ciphertext = read_input(input_path)?;
    Params::new(&ciphertext).map_err(|e| {
        e.with_context("data you specified is not a valid abcrypt encrypted data")
    })
}

/// Read the Argon2 type and version of an encrypted file
pub fn read_argon2_context(input_path: Option<&Path>) -> Result<Argon2Context> {
    let ciphertext = read_input(input_path)?;
    Argon2Context::new(&ciphertext).map_err(|e| {
        e.with_context("data you specified is not a valid abcrypt encrypted data")
    })
}

fn decrypt_context(err: AbcryptError) -> AbcryptError {
    let context = match err.kind {
        ErrorKind::InvalidHeaderMac => "passphrase is incorrect",
        ErrorKind::InvalidMac => "the encrypted data is corrupted",
        kind if kind.is_structural() => "the header in the encrypted data is invalid",
        _ => "the encrypted data could not be decrypted",
    };
    err.with_context(context)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).map_err(|e| read_error(path, e)),
        None => {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data).map_err(|e| {
                AbcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to read from stdin",
                    e,
                )
            })?;
            Ok(data)
        }
    }
}

fn write_output(path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match path {
        Some(path) => write_file_atomic(path, contents)
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    AbcryptError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
    }
}

/// Write `contents` to `path` via a tempfile in the same directory
///
/// Either the old file or the complete new file exists at `path`, never a
/// partial one.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                AbcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file.persist(path).map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;

    tracing::debug!(path = %path.display(), len = contents.len(), "wrote output file");
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> AbcryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    AbcryptError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("could not read data from {}", path.display()),
        err,
    )
}
