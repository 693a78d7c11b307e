// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream writer: a sequence of self-describing packets over a byte sink.
//!
//! Per concrete type, the first occurrence emits a freshly allocated type
//! code followed by the full definition; later occurrences emit only the
//! code (dynamic types re-emit their per-instance definition every time).
//! Required packets are written first, in dependency order, and
//! identity-cacheable packets are serialized at most once per stream with
//! later occurrences reduced to their 16-byte identity.
//!
//! All bookkeeping (code table, emitted-definition set, identity cache) is
//! scoped to this writer and dropped with it, never process-global.

use super::codec::{FieldWriter, ProtocolVersion};
use super::contract::{CacheablePacket, Packet};
use super::definition::{PacketDefinition, SubDefinitionKind};
use super::record::SerializedRecord;
use super::{Guid, PacketError, PacketResult};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

pub struct PacketWriter<W: Write> {
    codec: FieldWriter<W>,
    type_codes: HashMap<String, u64>,
    next_code: u64,
    written_ids: HashSet<Guid>,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(sink: W) -> Self {
        PacketWriter {
            codec: FieldWriter::new(sink),
            type_codes: HashMap::new(),
            next_code: 0,
            written_ids: HashSet::new(),
        }
    }

    pub fn with_version(sink: W, version: ProtocolVersion) -> PacketResult<Self> {
        Ok(PacketWriter {
            codec: FieldWriter::with_version(sink, version)?,
            type_codes: HashMap::new(),
            next_code: 0,
            written_ids: HashSet::new(),
        })
    }

    pub fn sink(&self) -> &W {
        self.codec.sink()
    }

    pub fn flush(&mut self) -> PacketResult<()> {
        self.codec.flush()
    }

    /// Hand back the sink, e.g. to finish a compression wrapper.
    pub fn into_inner(self) -> W {
        self.codec.into_inner()
    }

    /// Write one packet, its required packets first.
    pub fn write(&mut self, packet: &dyn Packet) -> PacketResult<()> {
        for dependency in packet.required_packets() {
            self.write_required(&dependency)?;
        }
        self.write_one(packet)
    }

    fn write_required(&mut self, dependency: &Arc<dyn CacheablePacket>) -> PacketResult<()> {
        if self.written_ids.contains(&dependency.packet_id()) {
            return Ok(());
        }
        let packet = dependency.as_packet();
        for nested in packet.required_packets() {
            self.write_required(&nested)?;
        }
        self.write_one(packet)
    }

    fn write_one(&mut self, packet: &dyn Packet) -> PacketResult<()> {
        let definition = packet.describe();
        let type_name = definition.type_name().to_string();
        let dynamic = packet.as_dynamic().is_some();

        match self.type_codes.get(&type_name).copied() {
            Some(code) => {
                self.codec.write_uvarint(code)?;
                if dynamic {
                    definition.write(&mut self.codec)?;
                }
            }
            None => {
                let code = self.next_code;
                self.next_code += 1;
                self.type_codes.insert(type_name.clone(), code);
                self.codec.write_uvarint(code)?;
                definition.write(&mut self.codec)?;
                log::trace!("emitted definition for {} as code {}", type_name, code);
            }
        }

        if let Some(cacheable) = packet.as_cacheable() {
            let id = cacheable.packet_id();
            self.codec.write_guid(&id)?;
            if !self.written_ids.insert(id) {
                log::trace!("back-reference to {} for {}", id, type_name);
                return Ok(());
            }
        }

        let mut record = SerializedRecord::new();
        packet.write_fields(&definition, &mut record)?;
        self.write_record(&definition, &record)
    }

    /// Serialize one record level against its definition: ancestor levels
    /// first, component fields at the owning level, then own fields in
    /// definition order.
    fn write_record(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        for sub in definition.subs() {
            match sub.kind {
                SubDefinitionKind::Ancestor => {
                    let parent = record.parent().ok_or_else(|| PacketError::MissingParent {
                        type_name: definition.type_name().to_string(),
                    })?;
                    self.write_record(&sub.definition, parent)?;
                }
                SubDefinitionKind::Component => {
                    self.write_record(&sub.definition, record)?;
                }
            }
        }
        for field in definition.fields() {
            let value = record.get(field.name())?;
            if value.field_type() != field.field_type() {
                return Err(PacketError::TypeMismatch {
                    name: field.name().to_string(),
                    expected: field.field_type().name(),
                    got: value.type_name(),
                });
            }
            self.codec.write_value(value)?;
        }
        Ok(())
    }
}
