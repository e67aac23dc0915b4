use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// The closed set of failure causes.
///
/// Every error produced by this crate carries exactly one kind, so consumers
/// (including the C ABI) can branch on it without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The encrypted data was shorter than the header plus the tag.
    InvalidLength,
    /// The magic number (file signature) was invalid.
    InvalidMagicNumber,
    /// The format version is known but no longer supported.
    UnsupportedVersion,
    /// The format version was never defined.
    UnknownVersion,
    /// The Argon2 type selector is out of range.
    InvalidArgon2Type,
    /// The Argon2 version selector is out of range.
    InvalidArgon2Version,
    /// The Argon2 cost parameters violate the KDF's limits.
    InvalidArgon2Params,
    /// The KDF rejected the parameter combination while deriving keys.
    InvalidArgon2Context,
    /// The header MAC did not verify. Almost always an incorrect passphrase.
    InvalidHeaderMac,
    /// The payload tag did not verify: corrupted or tampered ciphertext.
    InvalidMac,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
    /// Unexpected internal fault or caller precondition violation.
    General,
}

impl ErrorKind {
    /// Static, human-readable description of the kind.
    pub const fn detail(self) -> &'static str {
        match self {
            Self::InvalidLength => "encrypted data is shorter than 164 bytes",
            Self::InvalidMagicNumber => "invalid magic number",
            Self::UnsupportedVersion => "unsupported version number",
            Self::UnknownVersion => "unknown version number",
            Self::InvalidArgon2Type => "invalid Argon2 type",
            Self::InvalidArgon2Version => "invalid Argon2 version",
            Self::InvalidArgon2Params => "invalid Argon2 parameters",
            Self::InvalidArgon2Context => "invalid Argon2 context",
            Self::InvalidHeaderMac => "invalid header MAC",
            Self::InvalidMac => "invalid ciphertext MAC",
            Self::PassphraseUnavailable => "passphrase unavailable",
            Self::Io => "I/O error",
            Self::General => "general error",
        }
    }

    /// The category an error of this kind falls in when nothing more
    /// specific is known.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidArgon2Context | Self::Io | Self::General => ErrorCategory::Internal,
            _ => ErrorCategory::User,
        }
    }

    /// Whether the failure was detected while parsing the header structure,
    /// before any key derivation took place.
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::InvalidLength
                | Self::InvalidMagicNumber
                | Self::UnsupportedVersion
                | Self::UnknownVersion
                | Self::InvalidArgon2Type
                | Self::InvalidArgon2Version
                | Self::InvalidArgon2Params
        )
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct AbcryptError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Specific condition tag for consumers that need to branch their
    /// behavior.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl AbcryptError {
    /// Creates a new error with a required category, kind and display message.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

impl From<ErrorKind> for AbcryptError {
    fn from(kind: ErrorKind) -> Self {
        Self::with_kind(kind.category(), kind, kind.detail())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AbcryptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind_uses_detail() {
        let err = AbcryptError::from(ErrorKind::InvalidHeaderMac);
        assert_eq!(err.kind, ErrorKind::InvalidHeaderMac);
        assert_eq!(err.category, ErrorCategory::User);
        assert_eq!(err.to_string(), "invalid header MAC");
    }

    #[test]
    fn test_with_context_keeps_kind() {
        let err = AbcryptError::from(ErrorKind::InvalidMac).with_context("failed to decrypt");
        assert_eq!(err.kind, ErrorKind::InvalidMac);
        assert_eq!(err.message(), "failed to decrypt");
        let source = err.source_error().expect("context should keep the source");
        assert_eq!(source.to_string(), "invalid ciphertext MAC");
    }

    #[test]
    fn test_structural_kinds() {
        assert!(ErrorKind::InvalidLength.is_structural());
        assert!(ErrorKind::InvalidArgon2Params.is_structural());
        assert!(!ErrorKind::InvalidArgon2Context.is_structural());
        assert!(!ErrorKind::InvalidHeaderMac.is_structural());
        assert!(!ErrorKind::InvalidMac.is_structural());
    }

    #[test]
    fn test_details_are_distinct() {
        let kinds = [
            ErrorKind::InvalidLength,
            ErrorKind::InvalidMagicNumber,
            ErrorKind::UnsupportedVersion,
            ErrorKind::UnknownVersion,
            ErrorKind::InvalidArgon2Type,
            ErrorKind::InvalidArgon2Version,
            ErrorKind::InvalidArgon2Params,
            ErrorKind::InvalidArgon2Context,
            ErrorKind::InvalidHeaderMac,
            ErrorKind::InvalidMac,
            ErrorKind::PassphraseUnavailable,
            ErrorKind::Io,
            ErrorKind::General,
        ];
        let details: std::collections::HashSet<_> = kinds.iter().map(|k| k.detail()).collect();
        assert_eq!(details.len(), kinds.len());
    }
}
