// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Vellum Session Packager CLI
//!
//! Bundle recorded Vellum sessions into a transportable archive.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vellum::{Guid, Timestamp};
use vellum_packager::{Packager, PackagerConfig, SessionCriteria};

#[derive(Parser)]
#[command(name = "vellum-package")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bundle recorded Vellum sessions into transportable archives")]
#[command(long_about = None)]
struct Cli {
    /// Session directory to package from
    #[arg(short, long, default_value = "./sessions")]
    sessions: PathBuf,

    /// Output archive path (.vlmz)
    #[arg(short, long)]
    output: PathBuf,

    /// Only the session with this 32-character hex id
    #[arg(long)]
    session: Option<String>,

    /// Only sessions started before this RFC 3339 instant
    #[arg(long)]
    before: Option<String>,

    /// Verbose mode (show internal logs)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("vellum_packager=debug,vellum=debug")
    } else {
        EnvFilter::new("vellum_packager=info,vellum=warn")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let criteria = build_criteria(&cli)?;

    tracing::info!(
        sessions = %cli.sessions.display(),
        output = %cli.output.display(),
        "packaging sessions"
    );

    let packager = Packager::new(PackagerConfig {
        session_dir: cli.sessions,
        output: cli.output,
        criteria,
    });
    let summary = packager.run().context("Packaging failed")?;

    tracing::info!(
        sessions = summary.sessions,
        fragments = summary.fragments,
        raw_bytes = summary.raw_bytes,
        compressed_bytes = summary.compressed_bytes,
        archive = %summary.archive.display(),
        "packaging complete"
    );

    Ok(())
}

fn build_criteria(cli: &Cli) -> Result<SessionCriteria> {
    if cli.session.is_some() && cli.before.is_some() {
        bail!("--session and --before are mutually exclusive");
    }
    if let Some(hex) = &cli.session {
        let id = Guid::from_hex(hex)
            .with_context(|| format!("'{}' is not a 32-character hex session id", hex))?;
        return Ok(SessionCriteria::Session(id));
    }
    if let Some(cutoff) = &cli.before {
        let instant = chrono::DateTime::parse_from_rfc3339(cutoff)
            .with_context(|| format!("'{}' is not an RFC 3339 timestamp", cutoff))?;
        return Ok(SessionCriteria::StartedBefore(Timestamp::from_datetime(
            &instant.to_utc(),
        )));
    }
    Ok(SessionCriteria::All)
}
