//! Fetch CLI entrypoint.
//!
//! Resolves the manifest (from a URL or local path), detects the
//! current platform, runs the per-tool fetch pipeline, and maps the
//! aggregate outcome to the process exit code: 0 when every tool
//! reached installed or skipped, 1 when any tool failed, 2 on fatal
//! run errors.

use camino::Utf8PathBuf;
use clap::Parser;
use leancuts_fetch::cli::Cli;
use leancuts_fetch::download::{HttpDownloader, ToolDownloader, default_manifest_url};
use leancuts_fetch::error::RunError;
use leancuts_fetch::manifest::{Manifest, parse_manifest};
use leancuts_fetch::output::write_stderr_line;
use leancuts_fetch::pipeline::{FetchConfig, fetch_tools};
use leancuts_fetch::platform::Platform;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let exit_code = match run(&cli, &mut stderr) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            write_stderr_line(&mut stderr, format!("error: {err}"));
            2
        }
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Run the fetch pipeline; `Ok(true)` means every tool installed or
/// skipped.
fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<bool, RunError> {
    let platform = resolve_platform(cli.platform.as_deref())?;
    if !cli.quiet {
        write_stderr_line(stderr, format!("Platform: {platform}"));
    }

    let manifest = load_manifest(cli.manifest.as_deref(), cli.quiet, stderr)?;
    if !cli.quiet {
        write_stderr_line(stderr, format!("Manifest version: {}", manifest.version()));
    }

    let config = FetchConfig {
        output_dir: cli.output_dir.clone(),
        temp_dir: cli.temp_dir.clone(),
        quiet: cli.quiet,
    };
    let report = fetch_tools(&manifest, platform, &config, stderr)?;
    Ok(report.is_success())
}

/// Detect the current platform, honouring an explicit override.
fn resolve_platform(override_key: Option<&str>) -> Result<Platform, RunError> {
    match override_key {
        Some(key) => Ok(Platform::try_from(key)?),
        None => Ok(Platform::current()?),
    }
}

/// Obtain the manifest from a URL or local path.
///
/// Sources starting with `http://` or `https://` are downloaded; any
/// other value is read from the filesystem.
fn load_manifest(
    source: Option<&str>,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Manifest, RunError> {
    let source = source.map_or_else(default_manifest_url, str::to_owned);
    let json = if is_url(&source) {
        if !quiet {
            write_stderr_line(stderr, format!("Downloading manifest from {source}..."));
        }
        HttpDownloader
            .fetch_text(&source)
            .map_err(RunError::ManifestFetch)?
    } else {
        let path = Utf8PathBuf::from(&source);
        std::fs::read_to_string(path.as_std_path()).map_err(|io_err| RunError::ManifestRead {
            path,
            source: io_err,
        })?
    };
    Ok(parse_manifest(&json)?)
}

/// Whether a manifest source string is a URL rather than a local path.
fn is_url(source: &str) -> bool {
    source.starts_with("https://") || source.starts_with("http://")
}
