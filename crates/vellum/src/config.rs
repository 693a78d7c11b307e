// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Agent configuration.
//!
//! Built programmatically with the builder setters or loaded from a JSON
//! file. Everything has a sensible default except the product/application
//! names, which identify recorded sessions.

use crate::store::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Live-view endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveViewConfig {
    /// Viewer address, host:port.
    pub endpoint: String,
    /// Subscription criteria code sent at registration.
    #[serde(default)]
    pub criteria: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory session fragments and manifests are written to.
    pub session_dir: PathBuf,

    /// Product name recorded in session headers.
    pub product: String,

    /// Application name recorded in session headers.
    pub application: String,

    /// Deployment environment label (e.g. "production").
    #[serde(default)]
    pub environment: Option<String>,

    /// Roll fragments at this size, in megabytes.
    #[serde(default)]
    pub max_fragment_mb: Option<u64>,

    /// Roll fragments at this packet count.
    #[serde(default)]
    pub max_fragment_packets: Option<u64>,

    /// Optional live viewer to forward packets to.
    #[serde(default)]
    pub live_view: Option<LiveViewConfig>,
}

impl AgentConfig {
    pub fn new<P: AsRef<Path>>(session_dir: P) -> Self {
        AgentConfig {
            session_dir: session_dir.as_ref().to_path_buf(),
            product: "vellum".to_string(),
            application: "unknown".to_string(),
            environment: None,
            max_fragment_mb: Some(16),
            max_fragment_packets: None,
            live_view: None,
        }
    }

    /// Load from a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn max_fragment_mb(mut self, megabytes: u64) -> Self {
        self.max_fragment_mb = Some(megabytes);
        self.max_fragment_packets = None;
        self
    }

    pub fn max_fragment_packets(mut self, packets: u64) -> Self {
        self.max_fragment_packets = Some(packets);
        self.max_fragment_mb = None;
        self
    }

    pub fn live_view(mut self, endpoint: impl Into<String>, criteria: i32) -> Self {
        self.live_view = Some(LiveViewConfig {
            endpoint: endpoint.into(),
            criteria,
        });
        self
    }

    /// The rotation policy these settings amount to. Packet-count limits
    /// take precedence when both are set.
    pub fn rotation_policy(&self) -> Option<RotationPolicy> {
        if let Some(packets) = self.max_fragment_packets {
            return Some(RotationPolicy::by_packets(packets));
        }
        self.max_fragment_mb.map(RotationPolicy::by_size)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("./sessions")
    }
}
