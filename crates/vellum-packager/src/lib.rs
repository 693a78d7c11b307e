// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Vellum Session Packager
//!
//! Bundle recorded session fragments into transportable `.vlmz` archives.
//!
//! # Quick Start
//!
//! ```bash
//! # Bundle every session under ./sessions
//! vellum-package --sessions ./sessions --output support.vlmz
//!
//! # Only one session, by id
//! vellum-package --sessions ./sessions --output one.vlmz \
//!     --session 6fb1c0de58a94b02b0072f8fd1e02ab3
//!
//! # Sessions older than a cutoff
//! vellum-package --sessions ./sessions --output old.vlmz \
//!     --before 2026-08-01T00:00:00Z
//! ```

pub mod bundle;
pub mod selection;

pub use bundle::{
    list_bundle, unbundle, write_bundle, BundleEntry, BundleSummary, ARCHIVE_VERSION,
    BUNDLE_EXTENSION, MAGIC,
};
pub use selection::SessionCriteria;

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vellum::store;

/// Packager errors.
#[derive(Debug, Error)]
pub enum PackagerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Store error: {0}")]
    Store(#[from] vellum::StoreError),

    #[error("Invalid archive: {0}")]
    InvalidFormat(String),

    #[error("Archive version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("CRC mismatch in entry {name}")]
    CrcMismatch { name: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No sessions matched the selection criteria")]
    NoSessions,
}

/// Packaging run configuration.
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// Directory holding session fragments and manifests.
    pub session_dir: PathBuf,
    /// Archive to produce.
    pub output: PathBuf,
    /// Which sessions to include.
    pub criteria: SessionCriteria,
}

/// Result of one packaging run.
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub sessions: usize,
    pub fragments: usize,
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
    pub archive: PathBuf,
}

/// Bundles recorded sessions into one archive.
pub struct Packager {
    config: PackagerConfig,
}

impl Packager {
    pub fn new(config: PackagerConfig) -> Self {
        Packager { config }
    }

    pub fn run(&self) -> Result<PackageSummary, PackagerError> {
        let entries = store::sessions(&self.config.session_dir)?;
        let selected: Vec<_> = entries
            .into_iter()
            .filter(|entry| self.config.criteria.matches(entry))
            .collect();
        if selected.is_empty() {
            return Err(PackagerError::NoSessions);
        }

        let mut files = Vec::new();
        for entry in &selected {
            tracing::info!(
                session = %entry.session_id,
                fragments = entry.fragments.len(),
                bytes = entry.total_bytes,
                "selected session"
            );
            files.extend(entry.fragments.iter().cloned());
            // The sidecar manifest travels with its fragments when present.
            let manifest = self
                .config
                .session_dir
                .join(format!("{}.json", entry.session_id.to_hex()));
            if manifest.exists() {
                files.push(manifest);
            }
        }

        let summary = bundle::write_bundle(&self.config.output, &files)?;
        tracing::info!(
            archive = %self.config.output.display(),
            entries = summary.entries,
            raw = summary.raw_bytes,
            compressed = summary.compressed_bytes,
            "bundle written"
        );

        Ok(PackageSummary {
            sessions: selected.len(),
            fragments: selected.iter().map(|e| e.fragments.len()).sum(),
            raw_bytes: summary.raw_bytes,
            compressed_bytes: summary.compressed_bytes,
            archive: self.config.output.clone(),
        })
    }
}
