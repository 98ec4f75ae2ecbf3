//! Archive and manifest download over HTTPS.
//!
//! Provides a trait-based abstraction for fetching the manifest document
//! and tool archives, enabling dependency injection for testing. The
//! production implementation uses `ureq`, which follows redirects and
//! streams response bodies to disk.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// The GitHub repository owner/name for the published releases.
const GITHUB_REPO: &str = "leancuts/media-tools";

/// The release tag the manifest is published under.
const RELEASE_TAG: &str = "v1.0.0";

/// Network timeout for manifest and archive downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// The well-known URL of the published manifest.
#[must_use]
pub fn default_manifest_url() -> String {
    format!("https://github.com/{GITHUB_REPO}/releases/download/{RELEASE_TAG}/latest.json")
}

/// Trait for fetching release assets.
///
/// Abstractions allow tests to exercise the pipeline without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait ToolDownloader {
    /// Fetch the body at `url` as text (used for the manifest).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the asset is not found.
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;

    /// Fetch the body at `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the file write fails.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested asset was not found (HTTP 404).
    #[error("asset not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
pub struct HttpDownloader;

impl ToolDownloader for HttpDownloader {
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        log::debug!("fetching text from {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("fetching {url} to {}", dest.display());
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(())
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
