//! Passphrase reading functionality

use crate::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads the first line of any io::Read source
///
/// The line terminator (`\n` or `\r\n`) is not part of the passphrase.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        BufReader::new(&mut self.reader)
            .read_until(b'\n', &mut data)
            .map_err(|e| io_error("error reading passphrase", e))?;
        strip_line_ending(&mut data);
        Ok(data)
    }
}

/// Reads the passphrase from an environment variable
pub struct EnvPassphraseReader {
    name: OsString,
}

impl EnvPassphraseReader {
    pub fn new(name: impl Into<OsString>) -> Self {
        Self { name: name.into() }
    }
}

impl PassphraseReader for EnvPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let value = std::env::var_os(&self.name).ok_or_else(|| {
            AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                format!(
                    "environment variable {} is not set",
                    self.name.to_string_lossy()
                ),
            )
        })?;
        Ok(Zeroizing::new(value.into_encoded_bytes()))
    }
}

/// Reads the first line of a file as the passphrase
pub struct FilePassphraseReader {
    path: PathBuf,
}

impl FilePassphraseReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PassphraseReader for FilePassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let contents = Zeroizing::new(fs::read(&self.path).map_err(|e| {
            AbcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                format!("could not read passphrase from {}", self.path.display()),
                e,
            )
        })?);
        let end = contents
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(contents.len());
        let mut data = Zeroizing::new(contents[..end].to_vec());
        strip_line_ending(&mut data);
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
///
/// With confirmation enabled, the passphrase is asked for twice and the
/// prompt repeats until both entries match.
pub struct TerminalPassphraseReader {
    confirm: bool,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self { confirm: false }
    }

    /// A reader that asks for the passphrase twice, for encryption.
    pub fn with_confirmation() -> Self {
        Self { confirm: true }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from the controlling terminal.
    ///
    /// The terminal is opened directly, so stdin stays free for data.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        loop {
            let passphrase = prompt("Enter passphrase: ")?;
            if !self.confirm {
                return Ok(passphrase);
            }
            let confirmation = prompt("Confirm passphrase: ")?;
            if *passphrase == *confirmation {
                return Ok(passphrase);
            }
            eprintln!("Passphrases mismatch, try again");
        }
    }
}

fn prompt(message: &str) -> Result<Zeroizing<Vec<u8>>> {
    let mut stderr = io::stderr();
    stderr
        .write_all(message.as_bytes())
        .map_err(|e| io_error("failed to write prompt", e))?;
    stderr
        .flush()
        .map_err(|e| io_error("failed to flush prompt", e))?;

    // Read password *without echo*
    // Note: rpassword returns String (UTF-8 only), not zeroized
    let passphrase = rpassword::read_password().map_err(|e| {
        AbcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::PassphraseUnavailable,
            "could not read passphrase from terminal",
            e,
        )
    })?;

    Ok(Zeroizing::new(passphrase.into_bytes()))
}

fn strip_line_ending(data: &mut Vec<u8>) {
    if data.last() == Some(&b'\n') {
        data.pop();
        if data.last() == Some(&b'\r') {
            data.pop();
        }
    }
}

fn io_error(context: &str, e: io::Error) -> AbcryptError {
    AbcryptError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        context,
        e,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_constant_reader() {
        let mut reader = ConstantPassphraseReader::new(b"test123".to_vec());
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
    }

    /// Tests the terminal reader. This is ignored by default and must be run
    /// explicitly and with human input:
    ///
    /// cargo test test_terminal_reader_interactive -- --ignored --nocapture
    #[test]
    #[ignore]
    fn test_terminal_reader_interactive() {
        let mut reader = TerminalPassphraseReader::with_confirmation();
        println!("\nPlease enter a test passphrase twice:");
        let passphrase = reader.read_passphrase().unwrap();
        println!("You entered: {}", String::from_utf8_lossy(&passphrase));
        assert!(!passphrase.is_empty(), "Expected non-empty passphrase");
    }

    #[test]
    fn test_reader_passphrase_reader() {
        let data = b"mypassword";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"mypassword");
    }

    #[test]
    fn test_reader_passphrase_reader_first_line() {
        let data = b"mypassword\nsecond line\n";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"mypassword");

        let data = b"windows\r\n";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"windows");
    }

    #[test]
    fn test_reader_passphrase_reader_empty() {
        let data = b"";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"");
    }

    /// Verifies that ReaderPassphraseReader accepts arbitrary byte sequences,
    /// not just valid UTF-8. This enables --passphrase-stdin to work with
    /// passphrases containing non-UTF-8 bytes.
    #[test]
    fn test_reader_passphrase_reader_non_utf8() {
        let data: &[u8] = &[0xff, 0xfe, 0x00, 0x01];
        let mut reader = ReaderPassphraseReader::new(Box::new(data));
        assert_eq!(&*reader.read_passphrase().unwrap(), data);
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn test_reader_error_text_appears_once() {
        let mut reader = ReaderPassphraseReader::new(Box::new(BrokenReader));
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.to_string(), "error reading passphrase");
        assert_eq!(err.source_error().unwrap().to_string(), "device gone");
    }

    #[test]
    fn test_file_reader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("passphrase");
        fs::write(&path, b"from file\nignored\n").unwrap();

        let mut reader = FilePassphraseReader::new(&path);
        assert_eq!(&*reader.read_passphrase().unwrap(), b"from file");
    }

    #[test]
    fn test_file_reader_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut reader = FilePassphraseReader::new(temp_dir.path().join("missing"));
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, ErrorKind::PassphraseUnavailable);
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_env_reader_unset() {
        let mut reader = EnvPassphraseReader::new("ABCRYPT_TEST_PASSPHRASE_NEVER_SET");
        let err = reader.read_passphrase().unwrap_err();
        assert_eq!(err.kind, ErrorKind::PassphraseUnavailable);
    }

    #[test]
    fn test_env_reader_path() {
        // PATH is set in any environment the tests run in
        let expected = std::env::var_os("PATH").unwrap().into_encoded_bytes();
        let mut reader = EnvPassphraseReader::new("PATH");
        assert_eq!(&*reader.read_passphrase().unwrap(), &expected[..]);
    }
}
