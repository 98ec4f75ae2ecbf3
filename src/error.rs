//! Error taxonomy for the fetch pipeline.
//!
//! Per-tool failures ([`FetchError`]) are caught at the pipeline
//! boundary and recorded against the tool; they never abort processing
//! of other tools. Run-level failures ([`RunError`]) are fatal because
//! no tool can be resolved without a manifest and a platform.

use crate::digest::{DigestError, Sha256Digest};
use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::manifest::ManifestParseError;
use crate::platform::PlatformError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that fail a single tool's pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The archive download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The archive digest could not be computed.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// The archive digest does not match the manifest entry.
    ///
    /// This is the system's core trust boundary; a mismatching archive
    /// is never extracted.
    #[error("integrity check failed: expected {expected}, got {actual}")]
    Integrity {
        /// The digest recorded in the manifest.
        expected: Sha256Digest,
        /// The digest computed from the downloaded archive.
        actual: Sha256Digest,
    },

    /// The archive could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The manifest's executable path is absent after extraction.
    ///
    /// Signals a manifest/archive mismatch, distinct from an extraction
    /// failure.
    #[error("expected executable missing after extraction: {path}")]
    MissingExecutable {
        /// The path that should have existed.
        path: Utf8PathBuf,
    },

    /// Setting the executable bit failed.
    #[error("failed to mark {path} executable: {source}")]
    Permission {
        /// The extracted executable path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error outside the categories above (temp directory
    /// creation, cleanup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort the entire run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The manifest document could not be fetched.
    #[error("failed to fetch manifest: {0}")]
    ManifestFetch(#[source] DownloadError),

    /// The manifest document could not be read from a local path.
    #[error("failed to read manifest from {path}: {source}")]
    ManifestRead {
        /// The local manifest path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest document could not be parsed.
    #[error(transparent)]
    ManifestParse(#[from] ManifestParseError),

    /// The running host has no supported platform key.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The configured output directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
