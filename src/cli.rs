//! CLI argument definitions for the fetch binary.
//!
//! Separated from the main entrypoint to keep the binary focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Fetch prebuilt media tool binaries described by a release manifest.
#[derive(Parser, Debug)]
#[command(name = "leancuts-fetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch prebuilt media tool binaries described by a release manifest.\n\n",
    "The manifest lists, per tool and platform, the archive URL, its SHA-256 ",
    "digest, and the executable it contains. For each tool shipped for the ",
    "current platform the fetcher downloads the archive, verifies its digest, ",
    "extracts it into the output directory, and marks the executable runnable.\n\n",
    "Tools without an entry for the current platform are skipped. A failure in ",
    "one tool never aborts the others; the process exits non-zero if any tool ",
    "failed.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Fetch from the published release manifest:\n",
    "    $ leancuts-fetch\n\n",
    "  Fetch using a locally generated manifest:\n",
    "    $ leancuts-fetch --manifest manifests/latest.json\n\n",
    "  Install into a custom directory:\n",
    "    $ leancuts-fetch --output-dir /opt/leancuts/bin\n",
))]
pub struct Cli {
    /// Manifest URL or local file path [default: published release manifest].
    #[arg(long, value_name = "URL|PATH")]
    pub manifest: Option<String>,

    /// Directory where extracted binaries are installed.
    #[arg(short, long, value_name = "DIR", default_value = "binaries")]
    pub output_dir: Utf8PathBuf,

    /// Directory for temporary archive downloads [default: system temp].
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<Utf8PathBuf>,

    /// Override platform detection (darwin-arm64 or win32-x64).
    #[arg(long, value_name = "KEY")]
    pub platform: Option<String>,

    /// Suppress progress output (failures still shown).
    #[arg(short, long)]
    pub quiet: bool,
}
