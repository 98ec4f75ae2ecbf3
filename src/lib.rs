//! Leancuts binary fetcher library.
//!
//! This crate implements the manifest-driven download pipeline for the
//! prebuilt media tool binaries (FFmpeg, ImageMagick, ExifTool) the
//! application bundles. It is used by the `leancuts-fetch` and
//! `leancuts-generate-manifest` binaries and can be consumed
//! programmatically for testing or custom install workflows.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`digest`] - SHA-256 digest newtype, streaming computation, verification
//! - [`download`] - Downloader trait and `ureq` HTTP implementation
//! - [`error`] - Per-tool and run-level error taxonomy
//! - [`extraction`] - tar.gz / zip extraction and executable finalisation
//! - [`generate`] - Manifest generation from local release archives
//! - [`manifest`] - Manifest schema, parsing, and platform lookup
//! - [`output`] - Progress and status output formatting
//! - [`pipeline`] - Per-tool fetch pipeline orchestration
//! - [`platform`] - Closed platform-key set and host detection

pub mod cli;
pub mod digest;
pub mod download;
pub mod error;
pub mod extraction;
pub mod generate;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod platform;
