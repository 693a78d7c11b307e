// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet schema model: field types, field lists, and self-describing,
//! versioned packet definitions.
//!
//! A definition is built once per concrete type per stream (per instance for
//! dynamic types) and is immutable from then on. Ancestor and component
//! schemas nest as sub-definitions instead of being flattened, so an
//! ancestor's fields stay independently readable.

use super::codec::{FieldReader, FieldWriter};
use super::{PacketError, PacketResult};
use std::io::{Read, Write};

/// Wire-tagged field type. The codes are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    StringArray,
    Guid,
    Timestamp,
    Duration,
}

impl FieldType {
    pub(crate) fn code(self) -> u8 {
        match self {
            FieldType::Bool => 0,
            FieldType::Int32 => 1,
            FieldType::Int64 => 2,
            FieldType::Double => 3,
            FieldType::String => 4,
            FieldType::StringArray => 5,
            FieldType::Guid => 6,
            FieldType::Timestamp => 7,
            FieldType::Duration => 8,
        }
    }

    pub(crate) fn from_code(code: u8) -> PacketResult<Self> {
        Ok(match code {
            0 => FieldType::Bool,
            1 => FieldType::Int32,
            2 => FieldType::Int64,
            3 => FieldType::Double,
            4 => FieldType::String,
            5 => FieldType::StringArray,
            6 => FieldType::Guid,
            7 => FieldType::Timestamp,
            8 => FieldType::Duration,
            other => return Err(PacketError::UnknownFieldType { code: other }),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::StringArray => "string[]",
            FieldType::Guid => "guid",
            FieldType::Timestamp => "timestamp",
            FieldType::Duration => "duration",
        }
    }
}

/// One named, typed field. Order within a definition is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    field_type: FieldType,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDefinition {
            name: name.into(),
            field_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// Whether a nested definition describes an ancestor level (values live in
/// the record's parent level) or an embedded component (values live at the
/// owning level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubDefinitionKind {
    Ancestor,
    Component,
}

impl SubDefinitionKind {
    fn code(self) -> u8 {
        match self {
            SubDefinitionKind::Ancestor => 0,
            SubDefinitionKind::Component => 1,
        }
    }

    fn from_code(code: u8) -> PacketResult<Self> {
        match code {
            0 => Ok(SubDefinitionKind::Ancestor),
            1 => Ok(SubDefinitionKind::Component),
            other => Err(PacketError::InvalidData {
                reason: format!("unknown sub-definition kind {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubDefinition {
    pub kind: SubDefinitionKind,
    pub definition: PacketDefinition,
}

/// Self-describing schema for one concrete packet type.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketDefinition {
    type_name: String,
    version: u32,
    cacheable: bool,
    dynamic_name: Option<String>,
    fields: Vec<FieldDefinition>,
    subs: Vec<SubDefinition>,
    required_types: Vec<String>,
}

impl PacketDefinition {
    /// `version` is author-chosen and must be at least 1.
    pub fn new(type_name: impl Into<String>, version: u32) -> Self {
        debug_assert!(version >= 1, "packet versions start at 1");
        PacketDefinition {
            type_name: type_name.into(),
            version,
            cacheable: false,
            dynamic_name: None,
            fields: Vec::new(),
            subs: Vec::new(),
            required_types: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.fields.push(FieldDefinition::new(name, field_type));
    }

    /// Nest the ancestor's definition ahead of any fields or components
    /// declared so far; ancestor fields are always schema-positioned first.
    pub fn set_ancestor(&mut self, definition: PacketDefinition) {
        self.subs.insert(
            0,
            SubDefinition {
                kind: SubDefinitionKind::Ancestor,
                definition,
            },
        );
    }

    /// Register an embedded component schema, in the order components are
    /// written.
    pub fn add_component(&mut self, definition: PacketDefinition) {
        self.subs.push(SubDefinition {
            kind: SubDefinitionKind::Component,
            definition,
        });
    }

    pub fn require(&mut self, type_name: impl Into<String>) {
        self.required_types.push(type_name.into());
    }

    pub fn set_cacheable(&mut self) {
        self.cacheable = true;
    }

    pub fn set_dynamic(&mut self, discriminator: impl Into<String>) {
        self.dynamic_name = Some(discriminator.into());
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic_name.is_some()
    }

    pub fn dynamic_name(&self) -> Option<&str> {
        self.dynamic_name.as_deref()
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn subs(&self) -> &[SubDefinition] {
        &self.subs
    }

    /// The single ancestor sub-definition, if this type has one.
    pub fn ancestor(&self) -> Option<&PacketDefinition> {
        self.subs
            .iter()
            .find(|s| s.kind == SubDefinitionKind::Ancestor)
            .map(|s| &s.definition)
    }

    pub fn required_types(&self) -> &[String] {
        &self.required_types
    }

    pub fn write<W: Write>(&self, writer: &mut FieldWriter<W>) -> PacketResult<()> {
        writer.write_string(Some(&self.type_name))?;
        writer.write_uvarint(u64::from(self.version))?;

        let mut flags = 0u8;
        if self.cacheable {
            flags |= 0x01;
        }
        if self.dynamic_name.is_some() {
            flags |= 0x02;
        }
        writer.write_uvarint(u64::from(flags))?;
        if let Some(name) = &self.dynamic_name {
            writer.write_string(Some(name))?;
        }

        writer.write_uvarint(self.fields.len() as u64)?;
        for field in &self.fields {
            writer.write_string(Some(field.name()))?;
            writer.write_uvarint(u64::from(field.field_type().code()))?;
        }

        writer.write_uvarint(self.subs.len() as u64)?;
        for sub in &self.subs {
            writer.write_uvarint(u64::from(sub.kind.code()))?;
            sub.definition.write(writer)?;
        }

        writer.write_uvarint(self.required_types.len() as u64)?;
        for name in &self.required_types {
            writer.write_string(Some(name))?;
        }
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut FieldReader<R>) -> PacketResult<Self> {
        let type_name = read_required_string(reader, "type name")?;
        let version = reader.read_uvarint()? as u32;
        if version == 0 {
            return Err(PacketError::InvalidData {
                reason: format!("definition for {} has version 0", type_name),
            });
        }

        let flags = reader.read_uvarint()? as u8;
        let cacheable = flags & 0x01 != 0;
        let dynamic_name = if flags & 0x02 != 0 {
            Some(read_required_string(reader, "dynamic discriminator")?)
        } else {
            None
        };

        let field_count = reader.read_uvarint()? as usize;
        let mut fields = Vec::with_capacity(field_count.min(256));
        for _ in 0..field_count {
            let name = read_required_string(reader, "field name")?;
            let code = reader.read_uvarint()? as u8;
            fields.push(FieldDefinition::new(name, FieldType::from_code(code)?));
        }

        let sub_count = reader.read_uvarint()? as usize;
        let mut subs = Vec::with_capacity(sub_count.min(16));
        for _ in 0..sub_count {
            let kind = SubDefinitionKind::from_code(reader.read_uvarint()? as u8)?;
            let definition = PacketDefinition::read(reader)?;
            subs.push(SubDefinition { kind, definition });
        }

        let required_count = reader.read_uvarint()? as usize;
        let mut required_types = Vec::with_capacity(required_count.min(16));
        for _ in 0..required_count {
            required_types.push(read_required_string(reader, "required type name")?);
        }

        Ok(PacketDefinition {
            type_name,
            version,
            cacheable,
            dynamic_name,
            fields,
            subs,
            required_types,
        })
    }
}

fn read_required_string<R: Read>(
    reader: &mut FieldReader<R>,
    what: &str,
) -> PacketResult<String> {
    reader.read_string()?.ok_or_else(|| PacketError::InvalidData {
        reason: format!("definition {} is null", what),
    })
}
