// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragment rotation policies for long-running sessions.
//!
//! A session rolls to a new fragment file when the active fragment exceeds a
//! size, age, or packet-count limit. Each fragment is an independently
//! readable packet stream.

/// Rotation policy for session fragments.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pub trigger: RotationTrigger,
    pub pattern: RotationPattern,
}

/// Condition that rolls the active fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// Roll when the fragment reaches this many bytes on disk.
    Size(u64),
    /// Roll after this many seconds.
    Duration(u64),
    /// Roll after this many packets.
    Packets(u64),
}

/// Filename scheme for fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPattern {
    /// session_0001.vlm, session_0002.vlm, ...
    Sequential,
    /// session_20260214_093000.vlm
    Timestamp,
}

impl RotationPolicy {
    /// Size-based policy, in megabytes.
    pub fn by_size(max_size_mb: u64) -> Self {
        RotationPolicy {
            trigger: RotationTrigger::Size(max_size_mb * 1024 * 1024),
            pattern: RotationPattern::Sequential,
        }
    }

    pub fn by_duration(duration_secs: u64) -> Self {
        RotationPolicy {
            trigger: RotationTrigger::Duration(duration_secs),
            pattern: RotationPattern::Sequential,
        }
    }

    pub fn by_packets(max_packets: u64) -> Self {
        RotationPolicy {
            trigger: RotationTrigger::Packets(max_packets),
            pattern: RotationPattern::Sequential,
        }
    }

    pub fn with_timestamp_pattern(mut self) -> Self {
        self.pattern = RotationPattern::Timestamp;
        self
    }

    /// Whether the active fragment has crossed the trigger.
    pub fn should_rotate(&self, bytes_written: u64, elapsed_secs: u64, packets: u64) -> bool {
        match self.trigger {
            RotationTrigger::Size(max) => bytes_written >= max,
            RotationTrigger::Duration(max) => elapsed_secs >= max,
            RotationTrigger::Packets(max) => packets >= max,
        }
    }

    /// Filename for the fragment with the given index.
    pub fn fragment_name(&self, base: &str, extension: &str, index: u32) -> String {
        match self.pattern {
            RotationPattern::Sequential => format!("{}_{:04}.{}", base, index, extension),
            RotationPattern::Timestamp => {
                let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
                format!("{}_{}.{}", base, ts, extension)
            }
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::by_size(16)
    }
}
