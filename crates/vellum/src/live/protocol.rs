// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live-view wire protocol.
//!
//! Frame layout:
//!
//! ```text
//! +------+-------+-------+-------------+-----------------+
//! | code | major | minor | length (u32 | payload (length |
//! | (1)  | (1)   | (1)   | LE, 4)      | bytes)          |
//! +------+-------+-------+-------------+-----------------+
//! ```
//!
//! Payload primitives are serialized with the field codec; the raw packet
//! bytes of `PacketData` follow the codec-encoded session id verbatim.

use super::LiveError;
use crate::packet::{FieldReader, FieldWriter, Guid, Timestamp};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

pub const LIVE_PROTOCOL_MAJOR: u8 = 1;
pub const LIVE_PROTOCOL_MINOR: u8 = 0;

/// Upper bound on a frame payload; anything larger is a corrupt frame.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

const CODE_REGISTER: u8 = 1;
const CODE_SESSION_HEADER: u8 = 2;
const CODE_PACKET_DATA: u8 = 3;
const CODE_GOODBYE: u8 = 4;

/// Messages exchanged with a live viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveMessage {
    /// Agent announces itself and what it wants streamed back.
    RegisterAnalyst { analyst_id: Guid, criteria: i32 },

    /// Start of a session's live stream.
    SessionHeader {
        session_id: Guid,
        started: Timestamp,
        product: String,
    },

    /// One serialized packet from the session stream.
    PacketData { session_id: Guid, payload: Vec<u8> },

    /// Clean shutdown of a session's live stream.
    Goodbye { session_id: Guid },
}

impl LiveMessage {
    fn code(&self) -> u8 {
        match self {
            LiveMessage::RegisterAnalyst { .. } => CODE_REGISTER,
            LiveMessage::SessionHeader { .. } => CODE_SESSION_HEADER,
            LiveMessage::PacketData { .. } => CODE_PACKET_DATA,
            LiveMessage::Goodbye { .. } => CODE_GOODBYE,
        }
    }

    /// Encode to a framed byte vector ready for the socket.
    pub fn encode(&self) -> Result<Vec<u8>, LiveError> {
        let mut payload = Vec::new();
        {
            let mut codec = FieldWriter::new(&mut payload);
            match self {
                LiveMessage::RegisterAnalyst {
                    analyst_id,
                    criteria,
                } => {
                    codec.write_guid(analyst_id)?;
                    codec.write_i32(*criteria)?;
                }
                LiveMessage::SessionHeader {
                    session_id,
                    started,
                    product,
                } => {
                    codec.write_guid(session_id)?;
                    codec.write_timestamp(*started)?;
                    codec.write_string(Some(product))?;
                }
                LiveMessage::PacketData {
                    session_id,
                    payload: data,
                } => {
                    codec.write_guid(session_id)?;
                    drop(codec);
                    payload.extend_from_slice(data);
                }
                LiveMessage::Goodbye { session_id } => {
                    codec.write_guid(session_id)?;
                }
            }
        }

        let mut frame = Vec::with_capacity(7 + payload.len());
        frame.write_u8(self.code())?;
        frame.write_u8(LIVE_PROTOCOL_MAJOR)?;
        frame.write_u8(LIVE_PROTOCOL_MINOR)?;
        frame.write_u32::<LittleEndian>(payload.len() as u32)?;
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Read one framed message, or `None` at a clean end of stream.
    pub fn read_from<R: Read>(source: &mut R) -> Result<Option<LiveMessage>, LiveError> {
        let mut code_byte = [0u8; 1];
        loop {
            match source.read(&mut code_byte) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LiveError::Io(e)),
            }
        }
        let code = code_byte[0];

        let major = source.read_u8()?;
        let minor = source.read_u8()?;
        if major != LIVE_PROTOCOL_MAJOR {
            return Err(LiveError::UnsupportedProtocol { major, minor });
        }

        let len = source.read_u32::<LittleEndian>()?;
        if len > MAX_FRAME_BYTES {
            return Err(LiveError::FrameTooLarge { len });
        }
        let mut payload = vec![0u8; len as usize];
        source.read_exact(&mut payload)?;

        let mut codec = FieldReader::new(payload.as_slice());
        let message = match code {
            CODE_REGISTER => LiveMessage::RegisterAnalyst {
                analyst_id: codec.read_guid()?,
                criteria: codec.read_i32()?,
            },
            CODE_SESSION_HEADER => LiveMessage::SessionHeader {
                session_id: codec.read_guid()?,
                started: codec.read_timestamp()?,
                product: codec.read_string()?.unwrap_or_default(),
            },
            CODE_PACKET_DATA => LiveMessage::PacketData {
                session_id: codec.read_guid()?,
                payload: payload[16..].to_vec(),
            },
            CODE_GOODBYE => LiveMessage::Goodbye {
                session_id: codec.read_guid()?,
            },
            other => return Err(LiveError::UnknownMessage { code: other }),
        };
        Ok(Some(message))
    }
}
