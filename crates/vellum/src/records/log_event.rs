// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log event records.
//!
//! `LogEventPacket` derives from `EventHeaderPacket` (sequence + timestamp):
//! the ancestor's definition nests as a sub-definition and its fields land in
//! the parent record level, always ahead of the descendant's own fields. The
//! event's thread reference is a required dependency, so the stream writer
//! guarantees the `ThreadInfoPacket` is on the stream before the event that
//! points at it.

use super::thread_info::ThreadInfoPacket;
use crate::packet::{
    CacheablePacket, FieldType, FieldValue, Guid, Packet, PacketDefinition, PacketError,
    PacketResult, SerializedRecord, Timestamp,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Event severity, most severe last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    fn code(self) -> i32 {
        match self {
            Severity::Debug => 1,
            Severity::Info => 2,
            Severity::Warn => 3,
            Severity::Error => 4,
            Severity::Fatal => 5,
        }
    }

    fn from_code(code: i32) -> PacketResult<Self> {
        Ok(match code {
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Warn,
            4 => Severity::Error,
            5 => Severity::Fatal,
            other => {
                return Err(PacketError::InvalidData {
                    reason: format!("unknown severity code {}", other),
                })
            }
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        };
        f.write_str(label)
    }
}

/// Ancestor record: stream position and wall-clock of one event.
#[derive(Debug, Clone, Default)]
pub struct EventHeaderPacket {
    sequence: i64,
    timestamp: Timestamp,
}

impl EventHeaderPacket {
    pub const TYPE_NAME: &'static str = "EventHeader";
    const VERSION: u32 = 1;

    pub fn new(sequence: i64) -> Self {
        EventHeaderPacket {
            sequence,
            timestamp: Timestamp::now(),
        }
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::<EventHeaderPacket>::default()
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl Packet for EventHeaderPacket {
    fn describe(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
        def.add_field("sequence", FieldType::Int64);
        def.add_field("timestamp", FieldType::Timestamp);
        def
    }

    fn write_fields(
        &self,
        _definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("sequence", FieldValue::Int64(self.sequence))?;
        record.insert("timestamp", FieldValue::Timestamp(self.timestamp))
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            1 => {
                self.sequence = record.get_i64("sequence")?;
                self.timestamp = record.get_timestamp("timestamp")?;
                Ok(())
            }
            version => Err(PacketError::UnsupportedVersion {
                type_name: Self::TYPE_NAME.into(),
                version,
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One structured log message.
#[derive(Debug, Default)]
pub struct LogEventPacket {
    header: EventHeaderPacket,
    severity: Option<Severity>,
    category: String,
    message: String,
    detail: Option<String>,
    thread_ref: Guid,
    thread: Option<Arc<ThreadInfoPacket>>,
}

impl LogEventPacket {
    pub const TYPE_NAME: &'static str = "LogEvent";
    const VERSION: u32 = 1;

    pub fn new(
        sequence: i64,
        severity: Severity,
        category: &str,
        message: &str,
        thread: &Arc<ThreadInfoPacket>,
    ) -> Self {
        LogEventPacket {
            header: EventHeaderPacket::new(sequence),
            severity: Some(severity),
            category: category.to_string(),
            message: message.to_string(),
            detail: None,
            thread_ref: thread.id(),
            thread: Some(thread.clone()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::<LogEventPacket>::default()
    }

    pub fn header(&self) -> &EventHeaderPacket {
        &self.header
    }

    pub fn severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Info)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Identity of the thread record this event belongs to; resolve against
    /// the stream reader's identity cache.
    pub fn thread_ref(&self) -> Guid {
        self.thread_ref
    }
}

impl Packet for LogEventPacket {
    fn describe(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
        def.set_ancestor(self.header.describe());
        def.add_field("severity", FieldType::Int32);
        def.add_field("category", FieldType::String);
        def.add_field("message", FieldType::String);
        def.add_field("detail", FieldType::String);
        def.add_field("thread_ref", FieldType::Guid);
        def.require(ThreadInfoPacket::TYPE_NAME);
        def
    }

    fn write_fields(
        &self,
        definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("severity", FieldValue::Int32(self.severity().code()))?;
        record.insert("category", FieldValue::String(Some(self.category.clone())))?;
        record.insert("message", FieldValue::String(Some(self.message.clone())))?;
        record.insert("detail", FieldValue::String(self.detail.clone()))?;
        record.insert("thread_ref", FieldValue::Guid(self.thread_ref))?;

        let ancestor = definition
            .ancestor()
            .ok_or_else(|| PacketError::MissingParent {
                type_name: Self::TYPE_NAME.into(),
            })?;
        let mut parent = SerializedRecord::new();
        self.header.write_fields(ancestor, &mut parent)?;
        record.set_parent(parent);
        Ok(())
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            1 => {
                self.severity = Some(Severity::from_code(record.get_i32("severity")?)?);
                self.category = record
                    .get_string("category")?
                    .unwrap_or_default()
                    .to_string();
                self.message = record
                    .get_string("message")?
                    .unwrap_or_default()
                    .to_string();
                self.detail = record.get_string("detail")?.map(str::to_string);
                self.thread_ref = record.get_guid("thread_ref")?;

                let ancestor = definition
                    .ancestor()
                    .ok_or_else(|| PacketError::MissingParent {
                        type_name: Self::TYPE_NAME.into(),
                    })?;
                let parent = record.parent().ok_or_else(|| PacketError::MissingParent {
                    type_name: Self::TYPE_NAME.into(),
                })?;
                self.header.read_fields(ancestor, parent)
            }
            version => Err(PacketError::UnsupportedVersion {
                type_name: Self::TYPE_NAME.into(),
                version,
            }),
        }
    }

    fn required_packets(&self) -> Vec<Arc<dyn CacheablePacket>> {
        match &self.thread {
            Some(thread) => vec![thread.clone() as Arc<dyn CacheablePacket>],
            None => Vec::new(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
