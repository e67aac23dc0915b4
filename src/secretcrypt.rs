//! Encryption/decryption using Argon2 + XChaCha20-Poly1305 + BLAKE2b-512-MAC
//!
//! Encryption derives keys from the passphrase and a fresh salt, signs the
//! header, and seals the payload. Decryption checks the header structure,
//! re-derives the keys, verifies the header MAC, and only then opens the
//! payload. Errors therefore surface in a fixed order: structural header
//! errors, KDF errors, [`ErrorKind::InvalidHeaderMac`] (wrong passphrase),
//! and finally [`ErrorKind::InvalidMac`] (corrupted payload).
//!
//! [`ErrorKind::InvalidHeaderMac`]: crate::error::ErrorKind::InvalidHeaderMac
//! [`ErrorKind::InvalidMac`]: crate::error::ErrorKind::InvalidMac

use crate::aead;
use crate::argon2_context::{Variant, Version};
use crate::container::{self, Parts};
use crate::error::Result;
use crate::format::{Header, NONCE_LEN, SALT_LEN};
use crate::kdf::{self, DerivedKey};
use crate::params::Params;

/// Encrypts one plaintext into an abcrypt container.
///
/// Key derivation happens up front in the constructor, so a constructed
/// `Encryptor` only has to run the cipher.
#[derive(Debug)]
pub struct Encryptor<'a> {
    header: Header,
    dk: DerivedKey,
    plaintext: &'a [u8],
}

impl<'a> Encryptor<'a> {
    /// Creates an encryptor with the default Argon2 type, version and costs.
    pub fn new(plaintext: &'a [u8], passphrase: &[u8]) -> Result<Self> {
        Self::with_params(plaintext, passphrase, Params::default())
    }

    /// Creates an encryptor with Argon2id, version 0x13 and the given costs.
    pub fn with_params(plaintext: &'a [u8], passphrase: &[u8], params: Params) -> Result<Self> {
        Self::with_context(
            plaintext,
            passphrase,
            Variant::default(),
            Version::default(),
            params,
        )
    }

    /// Creates an encryptor with an explicit Argon2 type, version and costs.
    pub fn with_context(
        plaintext: &'a [u8],
        passphrase: &[u8],
        variant: Variant,
        version: Version,
        params: Params,
    ) -> Result<Self> {
        let header = Header::generate(variant, version, params);
        Self::with_header(plaintext, passphrase, header)
    }

    fn with_header(plaintext: &'a [u8], passphrase: &[u8], mut header: Header) -> Result<Self> {
        let dk = kdf::derive_keys(
            passphrase,
            header.salt(),
            header.variant(),
            header.argon2_version(),
            header.params(),
        )?;
        header.sign(dk.mac());
        Ok(Self {
            header,
            dk,
            plaintext,
        })
    }

    /// Writes the container into `buf`, which must be exactly
    /// [`Encryptor::out_len`] bytes long.
    pub fn encrypt(&self, buf: &mut [u8]) -> Result<()> {
        container::check_len(buf.len(), self.out_len())?;

        let (ciphertext, tag) = aead::seal(self.plaintext, self.dk.encrypt(), self.header.nonce())?;
        container::assemble_into(buf, &self.header, &ciphertext, &tag)?;

        tracing::debug!(plaintext_len = self.plaintext.len(), "encrypted payload");
        Ok(())
    }

    /// Encrypts into a newly allocated buffer.
    pub fn encrypt_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.out_len()];
        self.encrypt(&mut buf)?;
        Ok(buf)
    }

    /// Size of the container this encryptor produces.
    pub const fn out_len(&self) -> usize {
        container::encrypted_len(self.plaintext.len())
    }
}

/// Decrypts one abcrypt container.
///
/// The constructor parses the header, derives the keys and verifies the
/// header MAC, so an incorrect passphrase is reported before any payload
/// work is done.
#[derive(Debug)]
pub struct Decryptor<'a> {
    parts: Parts<'a>,
    dk: DerivedKey,
}

impl<'a> Decryptor<'a> {
    pub fn new(ciphertext: &'a [u8], passphrase: &[u8]) -> Result<Self> {
        let parts = container::disassemble(ciphertext)?;
        let header = &parts.header;
        let dk = kdf::derive_keys(
            passphrase,
            header.salt(),
            header.variant(),
            header.argon2_version(),
            header.params(),
        )?;
        header.verify(dk.mac())?;
        Ok(Self { parts, dk })
    }

    /// Writes the plaintext into `buf`, which must be exactly
    /// [`Decryptor::out_len`] bytes long.
    ///
    /// If the payload tag does not verify, `buf` is left zeroed.
    pub fn decrypt(&self, buf: &mut [u8]) -> Result<()> {
        container::check_len(buf.len(), self.out_len())?;

        buf.copy_from_slice(self.parts.ciphertext);
        aead::open_in_place(
            buf,
            &self.parts.tag,
            self.dk.encrypt(),
            self.parts.header.nonce(),
        )?;

        tracing::debug!(plaintext_len = buf.len(), "decrypted payload");
        Ok(())
    }

    /// Decrypts into a newly allocated buffer.
    pub fn decrypt_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.out_len()];
        self.decrypt(&mut buf)?;
        Ok(buf)
    }

    /// Size of the plaintext held by the container.
    pub const fn out_len(&self) -> usize {
        self.parts.ciphertext.len()
    }

    /// The Argon2 parameters the container was encrypted with.
    pub const fn params(&self) -> Params {
        self.parts.header.params()
    }
}

/// Encrypt `plaintext` with the default Argon2 type, version and costs.
pub fn encrypt(plaintext: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    Encryptor::new(plaintext, passphrase)?.encrypt_to_vec()
}

/// Encrypt `plaintext` with Argon2id, version 0x13 and the given costs.
pub fn encrypt_with_params(plaintext: &[u8], passphrase: &[u8], params: Params) -> Result<Vec<u8>> {
    Encryptor::with_params(plaintext, passphrase, params)?.encrypt_to_vec()
}

/// Encrypt `plaintext` with an explicit Argon2 type, version and costs.
pub fn encrypt_with_context(
    plaintext: &[u8],
    passphrase: &[u8],
    variant: Variant,
    version: Version,
    params: Params,
) -> Result<Vec<u8>> {
    Encryptor::with_context(plaintext, passphrase, variant, version, params)?.encrypt_to_vec()
}

/// Encrypt plaintext with a passphrase using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/nonce.
pub fn encrypt_deterministic(
    plaintext: &[u8],
    passphrase: &[u8],
    params: Params,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let header = Header::new(Variant::default(), Version::default(), params, *salt, *nonce);
    Encryptor::with_header(plaintext, passphrase, header)?.encrypt_to_vec()
}

/// Decrypt an abcrypt container with a passphrase
pub fn decrypt(ciphertext: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    Decryptor::new(ciphertext, passphrase)?.decrypt_to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{HEADER_SIZE, MAC_OFFSET};

    fn fast_params() -> Params {
        Params::from_costs(32, 3, 4).unwrap()
    }

    fn encrypt_fast(plaintext: &[u8], passphrase: &[u8]) -> Vec<u8> {
        encrypt_with_params(plaintext, passphrase, fast_params()).unwrap()
    }

    #[test]
    fn test_empty_plaintext() {
        let ciphertext = encrypt_fast(b"", b"test");
        assert_eq!(ciphertext.len(), 164);
        assert_eq!(decrypt(&ciphertext, b"test").unwrap(), b"");
    }

    #[test]
    fn test_small_plaintext() {
        let ciphertext = encrypt_fast(b"hello", b"test");
        assert_eq!(decrypt(&ciphertext, b"test").unwrap(), b"hello");
    }

    #[test]
    fn test_default_params_example() {
        let ciphertext = encrypt(b"hello", b"correct horse").unwrap();
        assert_eq!(ciphertext.len(), 169);
        assert_eq!(Params::new(&ciphertext).unwrap(), Params::default());
        assert_eq!(decrypt(&ciphertext, b"correct horse").unwrap(), b"hello");

        let err = decrypt(&ciphertext, b"wrong horse").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHeaderMac);
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let ciphertext = encrypt_fast(&plaintext, b"test");
        assert_eq!(ciphertext.len(), plaintext.len() + 164);
        assert_eq!(decrypt(&ciphertext, b"test").unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024]; // 128KB
        let ciphertext = encrypt_fast(&plaintext, b"test");
        assert_eq!(decrypt(&ciphertext, b"test").unwrap(), plaintext);
    }

    #[test]
    fn test_every_context() {
        for variant in [Variant::Argon2d, Variant::Argon2i, Variant::Argon2id] {
            for version in [Version::V0x10, Version::V0x13] {
                let ciphertext =
                    encrypt_with_context(b"hello", b"test", variant, version, fast_params())
                        .unwrap();
                assert_eq!(ciphertext[8], u32::from(variant) as u8);
                assert_eq!(ciphertext[12], u32::from(version) as u8);
                assert_eq!(decrypt(&ciphertext, b"test").unwrap(), b"hello");
            }
        }
    }

    #[test]
    fn test_encryptions_differ() {
        let ct1 = encrypt_fast(b"hello world", b"test");
        let ct2 = encrypt_fast(b"hello world", b"test");
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_deterministic_encryption() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];

        let ct1 = encrypt_deterministic(b"hello world", b"test", fast_params(), &salt, &nonce)
            .unwrap();
        let ct2 = encrypt_deterministic(b"hello world", b"test", fast_params(), &salt, &nonce)
            .unwrap();

        // Same salt/nonce produces identical ciphertext
        assert_eq!(ct1, ct2);
        assert_eq!(decrypt(&ct1, b"test").unwrap(), b"hello world");

        let ct3 = encrypt_deterministic(
            b"hello world",
            b"test",
            fast_params(),
            &salt,
            &[3u8; NONCE_LEN],
        )
        .unwrap();
        assert_ne!(ct1[HEADER_SIZE..], ct3[HEADER_SIZE..]);
    }

    #[test]
    fn test_wrong_passphrase() {
        let ciphertext = encrypt_fast(b"secret", b"correct");
        let err = decrypt(&ciphertext, b"wrong").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHeaderMac);
    }

    #[test]
    fn test_wrong_passphrase_reported_before_payload() {
        let mut ciphertext = encrypt_fast(b"secret", b"correct");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xff;
        ciphertext[HEADER_SIZE] ^= 0xff;

        let err = Decryptor::new(&ciphertext, b"wrong").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHeaderMac);

        let err = decrypt(&ciphertext, b"correct").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMac);
    }

    #[test]
    fn test_tampered_payload() {
        let ciphertext = encrypt_fast(b"hello", b"test");
        for i in HEADER_SIZE..ciphertext.len() {
            let mut corrupted = ciphertext.clone();
            corrupted[i] ^= 0x01;
            let err = decrypt(&corrupted, b"test").unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidMac, "byte {i}");
        }
    }

    #[test]
    fn test_tampered_salt_nonce_and_mac() {
        let ciphertext = encrypt_fast(b"hello", b"test");
        for i in [28, 59, 60, 83, MAC_OFFSET, HEADER_SIZE - 1] {
            let mut corrupted = ciphertext.clone();
            corrupted[i] ^= 0x80;
            let err = decrypt(&corrupted, b"test").unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidHeaderMac, "byte {i}");
        }
    }

    #[test]
    fn test_tampered_magic_with_correct_passphrase() {
        let mut ciphertext = encrypt_fast(b"hello", b"test");
        ciphertext[0] ^= 0x01;
        let err = decrypt(&ciphertext, b"test").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMagicNumber);
    }

    #[test]
    fn test_truncated() {
        let ciphertext = encrypt_fast(b"", b"test");
        let err = decrypt(&ciphertext[..163], b"test").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLength);
        let err = decrypt(&[], b"test").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLength);
    }

    #[test]
    fn test_truncated_payload_fails_authentication() {
        let ciphertext = encrypt_fast(b"hello", b"test");
        let err = decrypt(&ciphertext[..ciphertext.len() - 1], b"test").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMac);
    }

    #[test]
    fn test_wrong_sized_buffers() {
        let encryptor = Encryptor::with_params(b"hello", b"test", fast_params()).unwrap();
        assert_eq!(encryptor.out_len(), 169);
        let mut buf = vec![0u8; 168];
        assert_eq!(
            encryptor.encrypt(&mut buf).unwrap_err().kind,
            ErrorKind::General
        );

        let ciphertext = encryptor.encrypt_to_vec().unwrap();
        let decryptor = Decryptor::new(&ciphertext, b"test").unwrap();
        assert_eq!(decryptor.out_len(), 5);
        assert_eq!(decryptor.params(), fast_params());
        let mut buf = vec![0u8; 6];
        assert_eq!(
            decryptor.decrypt(&mut buf).unwrap_err().kind,
            ErrorKind::General
        );
    }

    #[test]
    fn test_failed_decrypt_zeroes_buffer() {
        let mut ciphertext = encrypt_fast(b"hello", b"test");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        let decryptor = Decryptor::new(&ciphertext, b"test").unwrap();
        let mut buf = vec![0xaau8; decryptor.out_len()];
        assert!(decryptor.decrypt(&mut buf).is_err());
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_params_survive_corrupted_payload() {
        let mut ciphertext = encrypt_fast(b"hello", b"test");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert_eq!(Params::new(&ciphertext).unwrap(), fast_params());
    }
}
