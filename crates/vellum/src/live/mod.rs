// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live-view protocol client (agent side).
//!
//! A small set of fixed-shape messages over TCP lets a viewer watch a
//! session as it is recorded. Only the field codec is used on this path;
//! the full record/schema machinery stays on the session-store path.

pub mod client;
pub mod protocol;

pub use client::{LiveClient, SharedLiveClient};
pub use protocol::{LiveMessage, LIVE_PROTOCOL_MAJOR, LIVE_PROTOCOL_MINOR};

use crate::packet::PacketError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported live protocol version {major}.{minor}")]
    UnsupportedProtocol { major: u8, minor: u8 },

    #[error("Unknown live message code {code}")]
    UnknownMessage { code: u8 },

    #[error("Frame of {len} bytes exceeds the live frame limit")]
    FrameTooLarge { len: u32 },

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Not connected")]
    NotConnected,
}
