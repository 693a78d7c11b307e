// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary packet serialization framework.
//!
//! Every record the agent persists (log events, metric samples, session
//! headers, thread references) passes through this module on its way to a
//! session file or the live viewer:
//!
//! ```text
//! record -> Packet contract -> SerializedRecord -> FieldWriter -> bytes
//! bytes  -> FieldReader -> SerializedRecord -> Packet contract -> record
//! ```
//!
//! The stream layer ([`PacketWriter`]/[`PacketReader`]) adds type-code
//! allocation, one-time schema emission per concrete type, dependency-first
//! ordering, and identity-based deduplication of shared packets. All state is
//! stream-scoped and single-threaded; callers sharing a writer across threads
//! hold their own lock around each logical operation.

pub mod codec;
pub mod contract;
pub mod definition;
pub mod guid;
pub mod reader;
pub mod record;
pub mod time;
pub mod writer;

pub use codec::{FieldReader, FieldValue, FieldWriter, ProtocolVersion};
pub use contract::{CacheablePacket, DynamicPacket, Packet, PacketFactory};
pub use definition::{FieldDefinition, FieldType, PacketDefinition, SubDefinitionKind};
pub use guid::Guid;
pub use reader::PacketReader;
pub use record::SerializedRecord;
pub use time::{TickDuration, Timestamp, TICKS_PER_SECOND};
pub use writer::PacketWriter;

use std::fmt;
use std::io;

/// Serialization error used throughout the packet framework.
///
/// Every variant is fatal for the record (and usually the stream) it occurred
/// in; the framework never degrades to a best-effort partial record.
#[derive(Debug)]
pub enum PacketError {
    /// `read_fields` was handed a definition version it does not implement.
    UnsupportedVersion { type_name: String, version: u32 },
    /// A type code resolved to a name with no registered factory.
    UnknownType { type_name: String },
    /// A protocol version newer than this implementation was requested.
    UnsupportedProtocol { major: u8, minor: u8 },
    /// A wire field-type code outside the known set.
    UnknownFieldType { code: u8 },
    /// Underlying byte source/sink failure, including truncation.
    Io(io::Error),
    /// Structurally invalid bytes (bad marker, overlong varint, bad UTF-8).
    InvalidData { reason: String },
    /// Field lookup failed in a `SerializedRecord`.
    FieldNotFound { name: String },
    /// Field value tag did not match the declared field type.
    TypeMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
    /// Two fields with the same name at one record level.
    DuplicateField { name: String },
    /// A definition declared an ancestor but the record carries no parent level.
    MissingParent { type_name: String },
    /// Durations cannot be negative at this layer.
    NegativeDuration { ticks: i64 },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::UnsupportedVersion { type_name, version } => {
                write!(f, "unsupported version {} for type {}", version, type_name)
            }
            PacketError::UnknownType { type_name } => {
                write!(f, "no factory registered for type {}", type_name)
            }
            PacketError::UnsupportedProtocol { major, minor } => {
                write!(f, "unsupported protocol version {}.{}", major, minor)
            }
            PacketError::UnknownFieldType { code } => {
                write!(f, "unknown field type code {}", code)
            }
            PacketError::Io(err) => write!(f, "i/o error: {}", err),
            PacketError::InvalidData { reason } => write!(f, "invalid data: {}", reason),
            PacketError::FieldNotFound { name } => write!(f, "field not found: {}", name),
            PacketError::TypeMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "type mismatch for field {}: expected {}, got {}",
                    name, expected, got
                )
            }
            PacketError::DuplicateField { name } => write!(f, "duplicate field: {}", name),
            PacketError::MissingParent { type_name } => {
                write!(f, "record for {} is missing its parent level", type_name)
            }
            PacketError::NegativeDuration { ticks } => {
                write!(f, "negative duration: {} ticks", ticks)
            }
        }
    }
}

impl std::error::Error for PacketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PacketError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PacketError {
    fn from(err: io::Error) -> Self {
        PacketError::Io(err)
    }
}

pub type PacketResult<T> = Result<T, PacketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_error_display_variants() {
        let err = PacketError::UnsupportedVersion {
            type_name: "LogEvent".into(),
            version: 9,
        };
        assert_eq!(err.to_string(), "unsupported version 9 for type LogEvent");

        let err = PacketError::UnknownType {
            type_name: "Mystery".into(),
        };
        assert_eq!(err.to_string(), "no factory registered for type Mystery");

        let err = PacketError::TypeMismatch {
            name: "severity".into(),
            expected: "int32",
            got: "string",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch for field severity: expected int32, got string"
        );

        let err = PacketError::NegativeDuration { ticks: -7 };
        assert_eq!(err.to_string(), "negative duration: -7 ticks");
    }

    #[test]
    fn test_packet_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err = PacketError::from(io_err);
        assert!(matches!(err, PacketError::Io(_)));
        assert!(err.to_string().contains("short read"));
    }
}
