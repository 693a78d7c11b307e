// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tick-based time values.
//!
//! Timestamps and durations are persisted as signed counts of 100-nanosecond
//! ticks; timestamps count from the Unix epoch. Sub-tick precision is
//! truncated on conversion, never rounded.

use super::{PacketError, PacketResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of 100-nanosecond ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

const NANOS_PER_TICK: i64 = 100;

/// Point in time as ticks since the Unix epoch. Pre-epoch instants are legal
/// and carry negative tick counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_ticks(ticks: i64) -> Self {
        Timestamp(ticks)
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp((d.as_nanos() / NANOS_PER_TICK as u128) as i64),
            // Pre-epoch: the remainder nanos push the value one tick earlier.
            Err(e) => {
                let nanos = e.duration().as_nanos() as i64;
                Timestamp(-(nanos / NANOS_PER_TICK))
            }
        }
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        let secs = dt.timestamp();
        let sub_ticks = (dt.timestamp_subsec_nanos() as i64) / NANOS_PER_TICK;
        Timestamp(secs * TICKS_PER_SECOND + sub_ticks)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.0.div_euclid(TICKS_PER_SECOND);
        let sub_nanos = (self.0.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
        DateTime::from_timestamp(secs, sub_nanos)
    }

    pub const fn ticks(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{} ticks", self.0),
        }
    }
}

/// Non-negative elapsed time in 100-nanosecond ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TickDuration(i64);

impl TickDuration {
    pub const ZERO: TickDuration = TickDuration(0);

    /// Negative tick counts are rejected here, before serialization is ever
    /// attempted; elapsed time has no negative representation at this layer.
    pub fn from_ticks(ticks: i64) -> PacketResult<Self> {
        if ticks < 0 {
            return Err(PacketError::NegativeDuration { ticks });
        }
        Ok(TickDuration(ticks))
    }

    /// Sub-tick precision is truncated; durations beyond the i64 tick range
    /// (≈ 29,000 years) clamp to the maximum.
    pub fn from_std(d: Duration) -> Self {
        let ticks = d.as_nanos() / NANOS_PER_TICK as u128;
        TickDuration(i64::try_from(ticks).unwrap_or(i64::MAX))
    }

    pub const fn ticks(&self) -> i64 {
        self.0
    }

    pub fn as_std(&self) -> Duration {
        Duration::from_nanos(self.0 as u64 * NANOS_PER_TICK as u64)
    }
}

impl fmt::Display for TickDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_std())
    }
}
