// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local session store: session fragment files in a session directory.
//!
//! The store owns the active fragment writer, the per-session thread record
//! cache, and the event sequence counter. All of it is session-scoped state,
//! dropped when the store closes.

pub mod file;
pub mod rotation;

pub use file::{
    SessionFileHeader, SessionFileReader, SessionFileSummary, SessionFileWriter,
    FORMAT_VERSION, FRAGMENT_EXTENSION, MAGIC,
};
pub use rotation::{RotationPattern, RotationPolicy, RotationTrigger};

use crate::config::AgentConfig;
use crate::packet::{Guid, Packet, PacketError, Timestamp};
use crate::records::{
    current_thread_key, LogEventPacket, MetricDefinitionPacket, MetricSamplePacket, MetricValue,
    SessionHeaderPacket, Severity, ThreadInfoPacket,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid session file: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("CRC mismatch in session body")]
    CrcMismatch,

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session is not open")]
    NotOpen,
}

/// Sidecar manifest written next to a session's fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: String,
    pub started: String,
    pub product: String,
    pub application: String,
    pub host_name: String,
    pub environment: Option<String>,
}

impl SessionManifest {
    fn from_header(header: &SessionHeaderPacket) -> Self {
        SessionManifest {
            session_id: header.id().to_hex(),
            started: header
                .started()
                .to_datetime()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            product: header.product().to_string(),
            application: header.application().to_string(),
            host_name: header.host_name().to_string(),
            environment: header.environment().map(str::to_string),
        }
    }
}

/// One recorded session found in a session directory.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub session_id: Guid,
    pub started: Timestamp,
    pub fragments: Vec<PathBuf>,
    pub total_bytes: u64,
}

/// Summary returned when a session closes.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: Guid,
    pub fragments: u32,
    pub packets: u64,
}

pub struct SessionStore {
    dir: PathBuf,
    base_name: String,
    header: SessionHeaderPacket,
    rotation: Option<RotationPolicy>,
    writer: Option<SessionFileWriter>,
    fragment_index: u32,
    fragment_opened: Instant,
    total_packets: u64,
    sequence: i64,
    threads: HashMap<i32, Arc<ThreadInfoPacket>>,
}

impl SessionStore {
    /// Start a new session: create the session directory, the first
    /// fragment, and the sidecar manifest.
    pub fn open(config: &AgentConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.session_dir)?;

        let mut header = SessionHeaderPacket::new(&config.product, &config.application);
        if let Some(environment) = &config.environment {
            header = header.with_environment(environment.clone());
        }
        let base_name = header.id().to_hex();
        let rotation = config.rotation_policy();

        let first = fragment_path(&config.session_dir, &base_name, &rotation, 0);
        let writer = SessionFileWriter::create(first, &header)?;

        let manifest = SessionManifest::from_header(&header);
        let manifest_path = config.session_dir.join(format!("{}.json", base_name));
        std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;

        log::info!(
            "session {} started for {}/{}",
            header.id(),
            header.product(),
            header.application()
        );

        Ok(SessionStore {
            dir: config.session_dir.clone(),
            base_name,
            header,
            rotation,
            writer: Some(writer),
            fragment_index: 0,
            fragment_opened: Instant::now(),
            total_packets: 0,
            sequence: 0,
            threads: HashMap::new(),
        })
    }

    pub fn session_id(&self) -> Guid {
        self.header.id()
    }

    /// Record one structured log event on the calling thread.
    pub fn log_event(
        &mut self,
        severity: Severity,
        category: &str,
        message: &str,
        detail: Option<&str>,
    ) -> Result<(), StoreError> {
        let thread = self
            .threads
            .entry(current_thread_key())
            .or_insert_with(|| Arc::new(ThreadInfoPacket::for_current_thread()))
            .clone();

        let mut event = LogEventPacket::new(self.sequence, severity, category, message, &thread);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.sequence += 1;
        self.write_packet(&event)
    }

    /// Record one metric sample. The metric's definition rides along as a
    /// dependency and is deduplicated per fragment.
    pub fn record_metric(
        &mut self,
        definition: &Arc<MetricDefinitionPacket>,
        values: &[MetricValue],
    ) -> Result<(), StoreError> {
        let sample = MetricSamplePacket::new(definition, values)?;
        self.write_packet(&sample)
    }

    /// Write any packet to the active fragment, rotating first if the
    /// policy says so.
    pub fn write_packet(&mut self, packet: &dyn Packet) -> Result<(), StoreError> {
        self.rotate_if_needed()?;
        let writer = self.writer.as_mut().ok_or(StoreError::NotOpen)?;
        writer.write(packet)?;
        self.total_packets += 1;
        Ok(())
    }

    fn rotate_if_needed(&mut self) -> Result<(), StoreError> {
        let Some(policy) = self.rotation.clone() else {
            return Ok(());
        };
        let Some(writer) = self.writer.as_ref() else {
            return Ok(());
        };
        let elapsed = self.fragment_opened.elapsed().as_secs();
        if !policy.should_rotate(writer.compressed_bytes(), elapsed, writer.packet_count()) {
            return Ok(());
        }

        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        self.fragment_index += 1;
        let path = fragment_path(&self.dir, &self.base_name, &self.rotation, self.fragment_index);
        // A fresh fragment is a fresh stream: schema and identity caches
        // start over, so each fragment is readable on its own.
        self.writer = Some(SessionFileWriter::create(&path, &self.header)?);
        self.fragment_opened = Instant::now();
        self.threads.clear();
        log::info!("rotated session {} to {}", self.header.id(), path.display());
        Ok(())
    }

    /// Close the session and finalize the active fragment.
    pub fn close(mut self) -> Result<SessionSummary, StoreError> {
        let writer = self.writer.take().ok_or(StoreError::NotOpen)?;
        writer.close()?;
        log::info!(
            "session {} closed ({} packets, {} fragments)",
            self.header.id(),
            self.total_packets,
            self.fragment_index + 1
        );
        Ok(SessionSummary {
            session_id: self.header.id(),
            fragments: self.fragment_index + 1,
            packets: self.total_packets,
        })
    }
}

fn fragment_path(
    dir: &Path,
    base_name: &str,
    rotation: &Option<RotationPolicy>,
    index: u32,
) -> PathBuf {
    let name = match rotation {
        Some(policy) => policy.fragment_name(base_name, FRAGMENT_EXTENSION, index),
        None => format!("{}_{:04}.{}", base_name, index, FRAGMENT_EXTENSION),
    };
    dir.join(name)
}

/// Enumerate recorded sessions in a directory by reading fragment headers,
/// grouping fragments by session identity.
pub fn sessions(dir: &Path) -> Result<Vec<SessionEntry>, StoreError> {
    let mut by_id: HashMap<Guid, SessionEntry> = HashMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
            continue;
        }
        let mut file = std::fs::File::open(&path)?;
        let header = match SessionFileHeader::read(&mut file) {
            Ok(header) => header,
            Err(err) => {
                log::warn!("skipping unreadable fragment {}: {}", path.display(), err);
                continue;
            }
        };
        let bytes = path.metadata().map(|m| m.len()).unwrap_or(0);
        let slot = by_id
            .entry(header.session_id)
            .or_insert_with(|| SessionEntry {
                session_id: header.session_id,
                started: header.started,
                fragments: Vec::new(),
                total_bytes: 0,
            });
        slot.fragments.push(path);
        slot.total_bytes += bytes;
    }

    let mut entries: Vec<SessionEntry> = by_id.into_values().collect();
    entries.sort_by_key(|e| e.started);
    for entry in &mut entries {
        entry.fragments.sort();
    }
    Ok(entries)
}
