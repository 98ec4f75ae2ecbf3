//! Per-tool fetch pipeline orchestration.
//!
//! For each tool in the manifest the pipeline runs the sequence
//! locate → download → verify → extract → finalise → cleanup. A missing
//! platform entry is a skip, not a failure. Per-tool failures are
//! recorded and never abort the remaining tools; the caller inspects
//! the aggregate [`FetchReport`] to decide the process exit code.

use camino::Utf8PathBuf;
use std::io::Write;

use crate::digest::compute_sha256;
use crate::download::{HttpDownloader, ToolDownloader};
use crate::error::{FetchError, RunError};
use crate::extraction::{extract, set_executable};
use crate::manifest::{Manifest, PlatformEntry};
use crate::output::{failure_message, skip_message, summary_message, write_stderr_line};
use crate::platform::Platform;

/// Configuration for a fetch run.
///
/// Paths are explicit rather than derived from the process working
/// directory, so callers control where binaries and scratch files land.
#[derive(Debug)]
pub struct FetchConfig {
    /// Directory where extracted binaries are installed.
    pub output_dir: Utf8PathBuf,
    /// Parent directory for per-tool scratch directories
    /// (system temp when `None`).
    pub temp_dir: Option<Utf8PathBuf>,
    /// When true, suppress progress output (failures still shown).
    pub quiet: bool,
}

/// Terminal state of one tool's pipeline.
#[derive(Debug)]
pub enum ToolOutcome {
    /// The tool was downloaded, verified, extracted, and finalised.
    Installed {
        /// Path of the installed executable.
        executable: Utf8PathBuf,
    },
    /// The manifest has no entry for this tool on the current platform.
    Skipped,
    /// The tool's pipeline failed; other tools are unaffected.
    Failed {
        /// The failure recorded against this tool.
        error: FetchError,
    },
}

/// One tool's name and terminal state.
#[derive(Debug)]
pub struct ToolReport {
    /// The tool name from the manifest.
    pub tool: String,
    /// The terminal pipeline state.
    pub outcome: ToolOutcome,
}

/// Aggregate outcome of a fetch run.
#[derive(Debug)]
pub struct FetchReport {
    reports: Vec<ToolReport>,
}

impl FetchReport {
    /// Per-tool reports in manifest order.
    #[must_use]
    pub fn reports(&self) -> &[ToolReport] {
        &self.reports
    }

    /// Whether every tool reached `Installed` or `Skipped`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Number of tools that reached `Installed`.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ToolOutcome::Installed { .. }))
    }

    /// Number of tools that reached `Skipped`.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ToolOutcome::Skipped))
    }

    /// Number of tools that reached `Failed`.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ToolOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ToolOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Fetch every tool in the manifest using the production HTTP downloader.
///
/// # Errors
///
/// Returns [`RunError::OutputDir`] if the output directory cannot be
/// created. Per-tool failures are recorded in the report, not returned.
pub fn fetch_tools(
    manifest: &Manifest,
    platform: Platform,
    config: &FetchConfig,
    stderr: &mut dyn Write,
) -> Result<FetchReport, RunError> {
    fetch_tools_with(manifest, platform, config, &HttpDownloader, stderr)
}

/// Testable variant of [`fetch_tools`] with an injected downloader.
///
/// # Errors
///
/// Returns [`RunError::OutputDir`] if the output directory cannot be
/// created.
pub fn fetch_tools_with(
    manifest: &Manifest,
    platform: Platform,
    config: &FetchConfig,
    downloader: &dyn ToolDownloader,
    stderr: &mut dyn Write,
) -> Result<FetchReport, RunError> {
    // Single up-front directory creation; idempotent and shared by all
    // tools, so per-tool work never races on it.
    std::fs::create_dir_all(config.output_dir.as_std_path()).map_err(|source| {
        RunError::OutputDir {
            path: config.output_dir.clone(),
            source,
        }
    })?;

    let mut reports = Vec::with_capacity(manifest.tool_count());
    for (tool, entry) in manifest.tools() {
        let outcome = match manifest.resolve_platform(tool, platform) {
            None => {
                if !config.quiet {
                    write_stderr_line(stderr, skip_message(tool, platform.key()));
                }
                ToolOutcome::Skipped
            }
            Some(platform_entry) => {
                if !config.quiet {
                    write_stderr_line(stderr, format!("Installing {tool} {}...", entry.version));
                }
                match install_tool(tool, platform_entry, platform, config, downloader) {
                    Ok(executable) => ToolOutcome::Installed { executable },
                    Err(error) => {
                        write_stderr_line(stderr, failure_message(tool, &error.to_string()));
                        ToolOutcome::Failed { error }
                    }
                }
            }
        };
        reports.push(ToolReport {
            tool: tool.to_owned(),
            outcome,
        });
    }

    let report = FetchReport { reports };
    if !config.quiet {
        write_stderr_line(
            stderr,
            summary_message(
                report.installed_count(),
                report.skipped_count(),
                report.failed_count(),
            ),
        );
    }
    Ok(report)
}

/// Run the download → verify → extract → finalise sequence for one tool.
///
/// The archive lives in a scratch directory scoped to this call; it is
/// removed on every exit path, success or failure.
fn install_tool(
    tool: &str,
    entry: &PlatformEntry,
    platform: Platform,
    config: &FetchConfig,
    downloader: &dyn ToolDownloader,
) -> Result<Utf8PathBuf, FetchError> {
    let scratch = match &config.temp_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir.as_std_path())?;
            tempfile::tempdir_in(dir.as_std_path())?
        }
        None => tempfile::tempdir()?,
    };
    let archive_name = format!("{tool}.{}", platform.archive_format().extension());
    let archive_path = scratch.path().join(archive_name);

    log::debug!(
        "{tool}: downloading {} ({} bytes expected)",
        entry.url,
        entry.size
    );
    downloader.fetch_to_file(&entry.url, &archive_path)?;

    let actual = compute_sha256(&archive_path)?;
    if actual != entry.sha256 {
        return Err(FetchError::Integrity {
            expected: entry.sha256.clone(),
            actual,
        });
    }
    log::debug!("{tool}: archive digest verified");

    extract(
        &archive_path,
        config.output_dir.as_std_path(),
        platform.archive_format(),
    )?;

    let exec_path = config.output_dir.join(&entry.executable);
    if !exec_path.as_std_path().is_file() {
        return Err(FetchError::MissingExecutable { path: exec_path });
    }
    if platform.uses_executable_bit() {
        set_executable(exec_path.as_std_path()).map_err(|source| FetchError::Permission {
            path: exec_path.clone(),
            source,
        })?;
    }

    Ok(exec_path)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
