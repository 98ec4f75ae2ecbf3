//! Pipeline behaviour tests with an injected downloader.
//!
//! These exercise the full locate → download → verify → extract →
//! finalise sequence against real archives built in-test; only the
//! network is mocked.

use super::*;
use crate::digest::Sha256Digest;
use crate::download::{DownloadError, MockToolDownloader};
use crate::manifest::{Manifest, PlatformEntry, ToolEntry};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;

/// Build a `.tar.gz` archive in memory containing the named entries.
fn tar_gz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("append entry");
    }
    let encoder = builder.into_inner().expect("tar finish");
    encoder.finish().expect("gzip finish")
}

fn digest_of(bytes: &[u8]) -> Sha256Digest {
    use sha2::{Digest, Sha256};
    let hex = format!("{:x}", Sha256::digest(bytes));
    Sha256Digest::try_from(hex).expect("valid digest")
}

fn platform_entry(url: &str, archive: &[u8], executable: &str) -> PlatformEntry {
    PlatformEntry {
        url: url.to_owned(),
        sha256: digest_of(archive),
        size: archive.len() as u64,
        executable: executable.to_owned(),
    }
}

fn manifest_with(tools: Vec<(&str, ToolEntry)>) -> Manifest {
    let tools = tools
        .into_iter()
        .map(|(name, entry)| (name.to_owned(), entry))
        .collect();
    Manifest::new("1.0.0".to_owned(), "2026-08-24T00:00:00Z".to_owned(), tools)
}

fn tool_entry(version: &str, platforms: Vec<(&str, PlatformEntry)>) -> ToolEntry {
    ToolEntry {
        version: version.to_owned(),
        platforms: platforms
            .into_iter()
            .map(|(key, entry)| (key.to_owned(), entry))
            .collect(),
    }
}

/// Downloader that serves canned bytes per URL and 404s everything else.
fn serving_downloader(responses: BTreeMap<String, Vec<u8>>) -> MockToolDownloader {
    let mut mock = MockToolDownloader::new();
    mock.expect_fetch_to_file()
        .returning(move |url, dest: &Path| match responses.get(url) {
            Some(bytes) => std::fs::write(dest, bytes).map_err(DownloadError::Io),
            None => Err(DownloadError::NotFound {
                url: url.to_owned(),
            }),
        });
    mock
}

fn config_for(dir: &Path) -> FetchConfig {
    FetchConfig {
        output_dir: Utf8PathBuf::from_path_buf(dir.join("binaries")).expect("utf-8 path"),
        temp_dir: None,
        quiet: false,
    }
}

#[test]
fn installs_tool_end_to_end() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"#!/bin/sh\necho foo\n")]);
    let url = "https://example.test/foo-darwin-arm64.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.2.3", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(report.is_success());
    assert_eq!(report.installed_count(), 1);
    let installed = config.output_dir.join("foo");
    let content = std::fs::read(installed.as_std_path()).expect("read installed");
    assert_eq!(content, b"#!/bin/sh\necho foo\n");
    let output = String::from_utf8_lossy(&stderr);
    assert!(output.contains("Installing foo 1.2.3"));
    assert!(output.contains("Installed 1 binary"));
}

#[cfg(unix)]
#[test]
fn installed_executable_carries_execute_bits() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
        .expect("run");

    let mode = std::fs::metadata(config.output_dir.join("foo").as_std_path())
        .expect("metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn corrupted_archive_fails_with_integrity_error() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    // Digest recorded against the pristine bytes, then one byte flipped
    // in what the downloader serves.
    let entry = platform_entry(url, &archive, "foo");
    let mut corrupted = archive.clone();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xff;
    let manifest = manifest_with(vec![("foo", tool_entry("1.0", vec![("darwin-arm64", entry)]))]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), corrupted)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(!report.is_success());
    assert!(matches!(
        &report.reports()[0].outcome,
        ToolOutcome::Failed {
            error: FetchError::Integrity { .. }
        }
    ));
    // The corrupt archive must never be extracted.
    assert!(!config.output_dir.join("foo").as_std_path().exists());
}

#[test]
fn missing_platform_entry_skips_tool() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry(
            "1.0",
            vec![(
                "win32-x64",
                platform_entry("https://example.test/foo.zip", &archive, "foo.exe"),
            )],
        ),
    )]);
    let downloader = MockToolDownloader::new();
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(report.is_success());
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.installed_count(), 0);
    let output = String::from_utf8_lossy(&stderr);
    assert!(output.contains("No foo binary for darwin-arm64"));
}

#[test]
fn one_tool_failure_does_not_abort_the_others() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let good_archive = tar_gz_bytes(&[("bar", b"bar payload")]);
    let good_url = "https://example.test/bar.tar.gz";
    let bad_url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![
        (
            "bar",
            tool_entry(
                "2.0",
                vec![("darwin-arm64", platform_entry(good_url, &good_archive, "bar"))],
            ),
        ),
        (
            "foo",
            tool_entry(
                "1.0",
                vec![("darwin-arm64", platform_entry(bad_url, &good_archive, "foo"))],
            ),
        ),
    ]);
    // Only bar's URL is served; foo's download 404s.
    let downloader = serving_downloader(BTreeMap::from([(good_url.to_owned(), good_archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(!report.is_success());
    assert_eq!(report.installed_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(config.output_dir.join("bar").as_std_path().is_file());
    let failed = report
        .reports()
        .iter()
        .find(|r| r.tool == "foo")
        .expect("foo report");
    assert!(matches!(
        &failed.outcome,
        ToolOutcome::Failed {
            error: FetchError::Download(DownloadError::NotFound { .. })
        }
    ));
}

#[test]
fn executable_missing_from_archive_is_distinct_failure() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    // Archive holds "bar" but the manifest promises "foo".
    let archive = tar_gz_bytes(&[("bar", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(matches!(
        &report.reports()[0].outcome,
        ToolOutcome::Failed {
            error: FetchError::MissingExecutable { .. }
        }
    ));
}

#[test]
fn rerun_produces_identical_result() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"stable payload")]);
    let url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let first =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("first run");
    let installed = config.output_dir.join("foo");
    let first_content = std::fs::read(installed.as_std_path()).expect("read first");
    let first_meta = std::fs::metadata(installed.as_std_path()).expect("meta first");

    let second =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("second run");
    let second_content = std::fs::read(installed.as_std_path()).expect("read second");
    let second_meta = std::fs::metadata(installed.as_std_path()).expect("meta second");

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(first_content, second_content);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(
            first_meta.permissions().mode() & 0o777,
            second_meta.permissions().mode() & 0o777
        );
    }
    let _ = (first_meta, second_meta);
}

#[test]
fn scratch_directory_is_removed_after_run() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let scratch_base = temp_dir.path().join("scratch");
    let config = FetchConfig {
        output_dir: Utf8PathBuf::from_path_buf(temp_dir.path().join("binaries"))
            .expect("utf-8 path"),
        temp_dir: Some(Utf8PathBuf::from_path_buf(scratch_base.clone()).expect("utf-8 path")),
        quiet: true,
    };
    let mut stderr = Vec::new();

    fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
        .expect("run");

    let leftovers: Vec<_> = std::fs::read_dir(&scratch_base)
        .expect("read scratch dir")
        .collect();
    assert!(leftovers.is_empty(), "temporary archives left behind");
}

#[test]
fn scratch_directory_is_removed_after_failure() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    let entry = platform_entry(url, &archive, "foo");
    let mut corrupted = archive;
    corrupted[0] ^= 0xff;
    let manifest = manifest_with(vec![("foo", tool_entry("1.0", vec![("darwin-arm64", entry)]))]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), corrupted)]));
    let scratch_base = temp_dir.path().join("scratch");
    let config = FetchConfig {
        output_dir: Utf8PathBuf::from_path_buf(temp_dir.path().join("binaries"))
            .expect("utf-8 path"),
        temp_dir: Some(Utf8PathBuf::from_path_buf(scratch_base.clone()).expect("utf-8 path")),
        quiet: true,
    };
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(!report.is_success());
    let leftovers: Vec<_> = std::fs::read_dir(&scratch_base)
        .expect("read scratch dir")
        .collect();
    assert!(leftovers.is_empty(), "temporary archives left behind");
}

#[test]
fn zip_archives_install_on_windows_platform() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("foo.exe", zip::write::SimpleFileOptions::default())
        .expect("start entry");
    writer.write_all(b"pe payload").expect("write entry");
    let archive = writer.finish().expect("zip finish").into_inner();
    let url = "https://example.test/foo-win32-x64.zip";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("win32-x64", platform_entry(url, &archive, "foo.exe"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = config_for(temp_dir.path());
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::Win32X64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(report.is_success());
    let content = std::fs::read(config.output_dir.join("foo.exe").as_std_path())
        .expect("read installed");
    assert_eq!(content, b"pe payload");
}

#[test]
fn quiet_mode_suppresses_progress_output() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let url = "https://example.test/foo.tar.gz";
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry("1.0", vec![("darwin-arm64", platform_entry(url, &archive, "foo"))]),
    )]);
    let downloader = serving_downloader(BTreeMap::from([(url.to_owned(), archive)]));
    let config = FetchConfig {
        quiet: true,
        ..config_for(temp_dir.path())
    };
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(report.is_success());
    assert!(stderr.is_empty(), "expected no output in quiet mode");
}

#[test]
fn failure_lines_are_written_even_in_quiet_mode() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let archive = tar_gz_bytes(&[("foo", b"payload")]);
    let manifest = manifest_with(vec![(
        "foo",
        tool_entry(
            "1.0",
            vec![(
                "darwin-arm64",
                platform_entry("https://example.test/missing.tar.gz", &archive, "foo"),
            )],
        ),
    )]);
    let downloader = serving_downloader(BTreeMap::new());
    let config = FetchConfig {
        quiet: true,
        ..config_for(temp_dir.path())
    };
    let mut stderr = Vec::new();

    let report =
        fetch_tools_with(&manifest, Platform::DarwinArm64, &config, &downloader, &mut stderr)
            .expect("run");

    assert!(!report.is_success());
    let output = String::from_utf8_lossy(&stderr);
    assert!(output.contains("foo failed"));
}
