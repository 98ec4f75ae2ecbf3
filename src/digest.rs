//! SHA-256 digest computation and verification.
//!
//! The digest is always computed over the exact bytes that travel over
//! the wire, i.e. the archive file. Files are streamed through the
//! hasher in fixed-size chunks so archives of any size can be verified
//! without loading them into memory.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Read buffer size for streaming digest computation.
const DIGEST_CHUNK: usize = 8192;

/// Errors arising from digest computation or validation.
#[derive(Debug, Error)]
pub enum DigestError {
    /// A digest string is not a well-formed 64-character hex value.
    #[error("invalid SHA-256 digest: {reason}")]
    Invalid {
        /// Description of the validation failure.
        reason: String,
    },

    /// I/O error reading the file being digested.
    #[error("failed to read file for digest: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated hex-encoded SHA-256 digest.
///
/// The value is normalised to lowercase at construction, so equality
/// comparison between digests is case-insensitive with respect to the
/// original input.
///
/// # Examples
///
/// ```
/// use leancuts_fetch::digest::Sha256Digest;
///
/// let upper = "A".repeat(64);
/// let digest: Sha256Digest = upper.as_str().try_into().expect("valid digest");
/// assert_eq!(digest.as_str(), "a".repeat(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, DigestError> {
        validate_hex(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, DigestError> {
        Self::try_from(value.as_str())
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a 64-character hex string.
fn validate_hex(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::Invalid {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::Invalid {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    Ok(())
}

/// Compute the SHA-256 digest of the file at `path`.
///
/// Reads the file in chunks and returns the lowercase hex digest as a
/// validated [`Sha256Digest`].
///
/// # Errors
///
/// Returns [`DigestError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest, DigestError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DIGEST_CHUNK];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    let hex = format!("{:x}", hasher.finalize());
    // sha2 always produces valid 64-char lowercase hex.
    Ok(Sha256Digest::try_from(hex).expect("sha2 produces valid 64-char lowercase hex"))
}

/// Check the file at `path` against an expected digest.
///
/// A mismatch is `Ok(false)`, not an error; callers must distinguish
/// "could not check" (an `Err`) from "checked and failed".
///
/// # Errors
///
/// Returns [`DigestError::Io`] if the file cannot be read.
pub fn verify(path: &Path, expected: &Sha256Digest) -> Result<bool, DigestError> {
    let actual = compute_sha256(path)?;
    Ok(actual == *expected)
}
