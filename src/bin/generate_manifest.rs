//! Manifest generation binary.
//!
//! Thin CLI wrapper around [`leancuts_fetch::generate`] that the release
//! workflow invokes after building the per-platform archives. Keeping the
//! digest and URL assembly in Rust ensures the generator and the fetcher
//! share one hashing convention: both operate on the archive bytes.

use camino::Utf8PathBuf;
use clap::Parser;
use leancuts_fetch::generate::{
    GenerateError, GenerateParams, GenerateSpec, generate_manifest, manifest_json,
};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Generate a release manifest from a directory of tool archives.
///
/// Reads a generation spec naming the tools, versions, and per-platform
/// executables, computes the SHA-256 digest and size of each archive in
/// the archives directory, and writes the manifest JSON consumed by
/// `leancuts-fetch`.
#[derive(Parser, Debug)]
#[command(name = "leancuts-generate-manifest")]
#[command(version, about = "Generate a release manifest from tool archives")]
struct GenerateCli {
    /// Path to the generation spec JSON.
    #[arg(long, value_name = "PATH")]
    spec: Utf8PathBuf,

    /// Directory containing the per-platform archives.
    #[arg(long, value_name = "DIR")]
    archives_dir: Utf8PathBuf,

    /// Path to write the manifest JSON to.
    #[arg(long, value_name = "PATH")]
    output: Utf8PathBuf,

    /// ISO 8601 timestamp for the `updated` field [default: current UTC time].
    #[arg(long, value_name = "TIMESTAMP")]
    generated_at: Option<String>,
}

/// Errors returned by the generator CLI.
#[derive(Debug, Error)]
enum GenerateCliError {
    /// Manifest generation failed.
    #[error("{0}")]
    Generate(#[from] GenerateError),

    /// The spec file could not be read.
    #[error("failed to read spec {path}: {source}")]
    SpecRead {
        /// Path passed as `--spec`.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be written.
    #[error("failed to write manifest {path}: {source}")]
    OutputWrite {
        /// Path passed as `--output`.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The `--generated-at` value is not `YYYY-MM-DDThh:mm:ssZ`.
    #[error("invalid --generated-at timestamp: {0}")]
    InvalidTimestamp(String),

    /// Failed to read the system clock.
    #[error("system time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),
}

fn main() {
    let cli = GenerateCli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Validate CLI inputs, generate the manifest, and report the output
/// path on stdout.
fn run(cli: GenerateCli) -> Result<(), GenerateCliError> {
    let spec_json =
        std::fs::read_to_string(cli.spec.as_std_path()).map_err(|source| {
            GenerateCliError::SpecRead {
                path: cli.spec.clone(),
                source,
            }
        })?;
    let spec = GenerateSpec::parse(&spec_json)?;

    let generated_at = match cli.generated_at {
        Some(ts) => {
            validate_iso8601(&ts)?;
            ts
        }
        None => now_utc_iso8601()?,
    };

    let params = GenerateParams {
        spec: &spec,
        archives_dir: &cli.archives_dir,
        generated_at,
    };
    let manifest = generate_manifest(&params)?;
    let json = manifest_json(&manifest)?;
    std::fs::write(cli.output.as_std_path(), json).map_err(|source| {
        GenerateCliError::OutputWrite {
            path: cli.output.clone(),
            source,
        }
    })?;

    println!("Wrote {}", cli.output);
    Ok(())
}

/// Verify that `ts` matches the expected `YYYY-MM-DDThh:mm:ssZ` shape.
fn validate_iso8601(ts: &str) -> Result<(), GenerateCliError> {
    let b = ts.as_bytes();
    let ok = b.len() == 20
        && b[4] == b'-'
        && b[7] == b'-'
        && b[10] == b'T'
        && b[13] == b':'
        && b[16] == b':'
        && b[19] == b'Z'
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[8..10].iter().all(u8::is_ascii_digit)
        && b[11..13].iter().all(u8::is_ascii_digit)
        && b[14..16].iter().all(u8::is_ascii_digit)
        && b[17..19].iter().all(u8::is_ascii_digit);
    if ok {
        Ok(())
    } else {
        Err(GenerateCliError::InvalidTimestamp(ts.to_owned()))
    }
}

/// Return the current UTC time as an ISO 8601 string (`YYYY-MM-DDThh:mm:ssZ`).
///
/// Uses `std::time::SystemTime` to avoid pulling in `chrono`.
fn now_utc_iso8601() -> Result<String, std::time::SystemTimeError> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(format_epoch_secs(secs))
}

/// Format a Unix epoch timestamp as `YYYY-MM-DDThh:mm:ssZ`.
fn format_epoch_secs(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_epoch(epoch_secs);
    let day_secs = (epoch_secs % 86_400) as u32;
    let hour = day_secs / 3_600;
    let minute = (day_secs % 3_600) / 60;
    let second = day_secs % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert a Unix epoch timestamp to a `(year, month, day)` triple.
///
/// Adapted from Howard Hinnant's public-domain `civil_from_days`
/// algorithm.
fn civil_from_epoch(epoch_secs: u64) -> (u32, u32, u32) {
    let z = (epoch_secs / 86_400) as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64; // day of era [0, 146_096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = (yoe as i64) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    #[expect(
        clippy::cast_sign_loss,
        reason = "year is always positive for post-epoch dates"
    )]
    (y as u32, m as u32, d as u32)
}
