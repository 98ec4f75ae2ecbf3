//! Manifest generation from a local directory of release archives.
//!
//! The generator scans a directory of already-built per-platform
//! archives named `<tool>-<platform-key>.<tar.gz|zip>`, computes the
//! SHA-256 digest and size of each archive, and assembles the manifest
//! the fetch pipeline consumes on another machine. Digests are computed
//! over the archive files themselves, the same bytes the fetcher
//! verifies after download.

use crate::digest::{DigestError, compute_sha256};
use crate::manifest::{Manifest, PlatformEntry, ToolEntry};
use crate::platform::Platform;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors arising from manifest generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// An expected source archive is absent.
    ///
    /// Generation fails fast rather than emitting a placeholder digest.
    #[error("source archive not found: {path}")]
    SourceFileMissing {
        /// The archive path that should have existed.
        path: Utf8PathBuf,
    },

    /// The generation spec could not be parsed.
    #[error("invalid generation spec: {0}")]
    Spec(#[from] serde_json::Error),

    /// Digest computation over a source archive failed.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// I/O error reading a source archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-tool input to the generator.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSpec {
    /// The tool name, used for manifest keys and archive file names.
    pub name: String,
    /// The tool's upstream version string.
    pub version: String,
    /// Platform key to executable name mapping; platforms absent here
    /// are not shipped for this tool.
    pub executables: BTreeMap<String, String>,
}

/// The generation spec document (`--spec` input).
///
/// # Examples
///
/// ```
/// use leancuts_fetch::generate::GenerateSpec;
///
/// let json = concat!(
///     r#"{"version":"1.0.0","#,
///     r#""base_url":"https://github.com/leancuts/media-tools/releases/download/v1.0.0","#,
///     r#""tools":[{"name":"ffmpeg","version":"6.0","#,
///     r#""executables":{"darwin-arm64":"ffmpeg","win32-x64":"ffmpeg.exe"}}]}"#,
/// );
/// let spec = GenerateSpec::parse(json).expect("valid spec");
/// assert_eq!(spec.tools.len(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSpec {
    /// The manifest version to emit.
    pub version: String,
    /// URL prefix the archive file names are appended to.
    pub base_url: String,
    /// Tools to include.
    pub tools: Vec<ToolSpec>,
}

impl GenerateSpec {
    /// Parse a JSON generation spec.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Spec`] on malformed JSON.
    pub fn parse(json: &str) -> Result<Self, GenerateError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Inputs for one generation run.
#[derive(Debug)]
pub struct GenerateParams<'a> {
    /// The parsed generation spec.
    pub spec: &'a GenerateSpec,
    /// Directory holding the source archives.
    pub archives_dir: &'a Utf8Path,
    /// ISO 8601 timestamp recorded as the manifest `updated` field.
    pub generated_at: String,
}

/// The archive file name for one tool on one platform.
#[must_use]
pub fn archive_file_name(tool: &str, platform: Platform) -> String {
    format!(
        "{tool}-{}.{}",
        platform.key(),
        platform.archive_format().extension()
    )
}

/// Generate a [`Manifest`] from local release archives.
///
/// Every platform a tool names in its spec must have a matching archive
/// on disk; a missing archive aborts generation.
///
/// # Errors
///
/// Returns [`GenerateError::SourceFileMissing`] for absent archives and
/// propagates digest and I/O failures.
pub fn generate_manifest(params: &GenerateParams<'_>) -> Result<Manifest, GenerateError> {
    let mut tools = BTreeMap::new();
    for tool in &params.spec.tools {
        let mut platforms = BTreeMap::new();
        for &platform in Platform::all() {
            let Some(executable) = tool.executables.get(platform.key()) else {
                continue;
            };
            let file_name = archive_file_name(&tool.name, platform);
            let archive_path = params.archives_dir.join(&file_name);
            if !archive_path.as_std_path().is_file() {
                return Err(GenerateError::SourceFileMissing { path: archive_path });
            }

            let sha256 = compute_sha256(archive_path.as_std_path())?;
            let size = std::fs::metadata(archive_path.as_std_path())?.len();
            platforms.insert(
                platform.key().to_owned(),
                PlatformEntry {
                    url: format!("{}/{file_name}", params.spec.base_url.trim_end_matches('/')),
                    sha256,
                    size,
                    executable: executable.clone(),
                },
            );
        }
        tools.insert(
            tool.name.clone(),
            ToolEntry {
                version: tool.version.clone(),
                platforms,
            },
        );
    }
    Ok(Manifest::new(
        params.spec.version.clone(),
        params.generated_at.clone(),
        tools,
    ))
}

/// Serialize a [`Manifest`] to pretty-printed JSON for publication.
///
/// # Errors
///
/// Returns [`GenerateError::Spec`] if serialization fails.
pub fn manifest_json(manifest: &Manifest) -> Result<String, GenerateError> {
    Ok(serde_json::to_string_pretty(manifest)?)
}
