//! Manifest schema types and JSON parsing.
//!
//! The manifest is a versioned JSON document listing tools and, per
//! tool, per-platform download and verification metadata. It is parsed
//! once at run start and immutable afterwards. Platform URLs are not
//! validated eagerly; bad entries surface when the pipeline uses them.

use crate::digest::Sha256Digest;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors arising from manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// JSON deserialization or field validation failed.
    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest carries an empty `version` field.
    #[error("manifest version must not be empty")]
    EmptyVersion,

    /// The manifest lists no tools.
    #[error("manifest lists no tools")]
    NoTools,
}

/// Download and verification metadata for one tool on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Location of the published archive.
    pub url: String,
    /// SHA-256 digest of the archive file.
    pub sha256: Sha256Digest,
    /// Size of the archive in bytes.
    pub size: u64,
    /// Relative path of the runnable artifact after extraction.
    pub executable: String,
}

/// One tool's version and per-platform entries.
///
/// Platform keys outside the supported set are carried as-is and
/// simply never resolved; they are not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    /// The tool's upstream version string.
    pub version: String,
    /// Platform key to entry mapping.
    pub platforms: BTreeMap<String, PlatformEntry>,
}

/// The published manifest consumed by the fetch pipeline.
///
/// # Examples
///
/// ```
/// use leancuts_fetch::manifest::parse_manifest;
/// use leancuts_fetch::platform::Platform;
///
/// let json = concat!(
///     r#"{"version":"1.0.0","updated":"2026-08-24T00:00:00Z","tools":{"#,
///     r#""ffmpeg":{"version":"6.0","platforms":{"darwin-arm64":{"#,
///     r#""url":"https://example.test/ffmpeg-darwin-arm64.tar.gz","#,
///     r#""sha256":"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","#,
///     r#""size":10,"executable":"ffmpeg"}}}}}"#,
/// );
/// let manifest = parse_manifest(json).expect("valid manifest");
/// let entry = manifest.resolve_platform("ffmpeg", Platform::DarwinArm64);
/// assert!(entry.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    version: String,
    updated: String,
    tools: BTreeMap<String, ToolEntry>,
}

impl Manifest {
    /// Construct a manifest from its parts.
    ///
    /// Used by the generator; the fetch side obtains manifests through
    /// [`parse_manifest`].
    #[must_use]
    pub fn new(version: String, updated: String, tools: BTreeMap<String, ToolEntry>) -> Self {
        Self {
            version,
            updated,
            tools,
        }
    }

    /// Return the manifest version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the generation timestamp string.
    #[must_use]
    pub fn updated(&self) -> &str {
        &self.updated
    }

    /// Iterate over `(tool name, entry)` pairs in deterministic order.
    pub fn tools(&self) -> impl Iterator<Item = (&str, &ToolEntry)> {
        self.tools.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Return the number of tools listed.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Look up the entry for `tool` on `platform`.
    ///
    /// Absence means the manifest does not ship that tool for that
    /// platform; the pipeline treats this as a skip, never a failure.
    #[must_use]
    pub fn resolve_platform(&self, tool: &str, platform: Platform) -> Option<&PlatformEntry> {
        self.tools
            .get(tool)
            .and_then(|entry| entry.platforms.get(platform.key()))
    }
}

/// Parse a JSON string into a validated [`Manifest`].
///
/// Digest fields are validated during deserialization. A usable
/// manifest must carry a non-empty `version` and at least one tool.
///
/// # Errors
///
/// Returns [`ManifestParseError`] if the JSON is malformed, a field
/// fails validation, or a top-level invariant is violated.
pub fn parse_manifest(json: &str) -> Result<Manifest, ManifestParseError> {
    let manifest: Manifest = serde_json::from_str(json)?;
    if manifest.version.is_empty() {
        return Err(ManifestParseError::EmptyVersion);
    }
    if manifest.tools.is_empty() {
        return Err(ManifestParseError::NoTools);
    }
    Ok(manifest)
}
