//! Platform key resolution for binary distribution.
//!
//! Only the two platform keys the release matrix ships for are accepted.
//! Detection maps the running operating system and CPU architecture to a
//! key explicitly; unrecognised combinations fail fast rather than
//! defaulting to an arbitrary platform.

use std::fmt;
use thiserror::Error;

/// The archive format used for a platform's release assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive (`.tar.gz`).
    TarGz,
    /// Zip archive (`.zip`).
    Zip,
}

impl ArchiveFormat {
    /// Return the file extension for this format, without a leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// The supported platform keys for binary distribution.
const SUPPORTED_KEYS: &[&str] = &["darwin-arm64", "win32-x64"];

/// A platform the release matrix ships binaries for.
///
/// The set is closed: manifest entries for other keys are carried but
/// never resolved, and detection rejects any host outside this set.
///
/// # Examples
///
/// ```
/// use leancuts_fetch::platform::Platform;
///
/// let platform: Platform = "darwin-arm64".try_into().expect("valid key");
/// assert_eq!(platform.key(), "darwin-arm64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Apple Silicon macOS (`darwin-arm64`), tar.gz archives.
    DarwinArm64,
    /// 64-bit x86 Windows (`win32-x64`), zip archives.
    Win32X64,
}

/// Errors arising from platform detection and key parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The running OS/architecture combination has no platform key.
    #[error("unsupported platform: os \"{os}\", arch \"{arch}\"; binaries are published for: {expected}")]
    Unsupported {
        /// The detected operating system name.
        os: String,
        /// The detected CPU architecture.
        arch: String,
        /// Comma-separated list of supported keys.
        expected: String,
    },

    /// A platform key string is not in the supported set.
    #[error("unknown platform key \"{value}\"; expected one of: {expected}")]
    UnknownKey {
        /// The rejected key string.
        value: String,
        /// Comma-separated list of supported keys.
        expected: String,
    },
}

impl Platform {
    /// Return the manifest key for this platform.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::DarwinArm64 => "darwin-arm64",
            Self::Win32X64 => "win32-x64",
        }
    }

    /// Return the archive format used for this platform's assets.
    #[must_use]
    pub const fn archive_format(self) -> ArchiveFormat {
        match self {
            Self::DarwinArm64 => ArchiveFormat::TarGz,
            Self::Win32X64 => ArchiveFormat::Zip,
        }
    }

    /// Whether executables on this platform carry a filesystem execute bit.
    #[must_use]
    pub const fn uses_executable_bit(self) -> bool {
        matches!(self, Self::DarwinArm64)
    }

    /// Return all platforms in the supported set.
    #[must_use]
    pub const fn all() -> &'static [Platform] {
        &[Self::DarwinArm64, Self::Win32X64]
    }

    /// Detect the platform of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] when the OS/architecture
    /// combination is outside the release matrix.
    pub fn current() -> Result<Self, PlatformError> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map an OS name and CPU architecture to a platform key.
    ///
    /// Pure function; the names follow `std::env::consts::{OS, ARCH}`.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, PlatformError> {
        match (os, arch) {
            ("macos", "aarch64") => Ok(Self::DarwinArm64),
            ("windows", "x86_64") => Ok(Self::Win32X64),
            _ => Err(PlatformError::Unsupported {
                os: os.to_owned(),
                arch: arch.to_owned(),
                expected: SUPPORTED_KEYS.join(", "),
            }),
        }
    }
}

impl TryFrom<&str> for Platform {
    type Error = PlatformError;

    fn try_from(value: &str) -> Result<Self, PlatformError> {
        match value {
            "darwin-arm64" => Ok(Self::DarwinArm64),
            "win32-x64" => Ok(Self::Win32X64),
            _ => Err(PlatformError::UnknownKey {
                value: value.to_owned(),
                expected: SUPPORTED_KEYS.join(", "),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
