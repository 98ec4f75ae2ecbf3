//! Progress and status output for the fetch CLI.
//!
//! Human-readable lines are written to an injected stderr sink so that
//! tests can capture output; no core logic depends on this module.

use std::io::Write;

/// Write a single line to the stderr sink.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the status line for a skipped tool.
#[must_use]
pub fn skip_message(tool: &str, platform_key: &str) -> String {
    format!("No {tool} binary for {platform_key}; skipping.")
}

/// Format the status line for a failed tool.
#[must_use]
pub fn failure_message(tool: &str, reason: &str) -> String {
    format!("{tool} failed: {reason}")
}

/// Format the final aggregate summary.
#[must_use]
pub fn summary_message(installed: usize, skipped: usize, failed: usize) -> String {
    if failed == 0 {
        let plural = if installed == 1 { "binary" } else { "binaries" };
        format!("Installed {installed} {plural} ({skipped} skipped).")
    } else {
        format!("{failed} tool(s) failed; installed {installed}, skipped {skipped}.")
    }
}
