// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric records.
//!
//! A `MetricDefinitionPacket` names a metric and its ordered value columns;
//! it is identity-cacheable and shared by every sample of that metric. A
//! `MetricSamplePacket` is a dynamic record: its field set comes from its
//! definition's columns, so its schema is serialized alongside every
//! instance with the metric name as the discriminator.

use crate::packet::{
    CacheablePacket, DynamicPacket, FieldType, FieldValue, Guid, Packet, PacketDefinition,
    PacketError, PacketResult, SerializedRecord, Timestamp,
};
use std::any::Any;
use std::sync::Arc;

/// Value kind of one metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricColumnKind {
    Integer,
    Float,
}

impl MetricColumnKind {
    fn label(self) -> &'static str {
        match self {
            MetricColumnKind::Integer => "int64",
            MetricColumnKind::Float => "double",
        }
    }

    fn from_label(label: &str) -> PacketResult<Self> {
        match label {
            "int64" => Ok(MetricColumnKind::Integer),
            "double" => Ok(MetricColumnKind::Float),
            other => Err(PacketError::InvalidData {
                reason: format!("unknown metric column kind {}", other),
            }),
        }
    }

    fn field_type(self) -> FieldType {
        match self {
            MetricColumnKind::Integer => FieldType::Int64,
            MetricColumnKind::Float => FieldType::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricColumn {
    pub name: String,
    pub kind: MetricColumnKind,
}

impl MetricColumn {
    pub fn integer(name: impl Into<String>) -> Self {
        MetricColumn {
            name: name.into(),
            kind: MetricColumnKind::Integer,
        }
    }

    pub fn float(name: impl Into<String>) -> Self {
        MetricColumn {
            name: name.into(),
            kind: MetricColumnKind::Float,
        }
    }
}

/// One sampled value, matching its column's kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl MetricValue {
    fn kind(&self) -> MetricColumnKind {
        match self {
            MetricValue::Integer(_) => MetricColumnKind::Integer,
            MetricValue::Float(_) => MetricColumnKind::Float,
        }
    }
}

/// Shared description of one metric; serialized once per stream.
#[derive(Debug, Clone)]
pub struct MetricDefinitionPacket {
    id: Guid,
    name: String,
    unit: Option<String>,
    columns: Vec<MetricColumn>,
}

impl MetricDefinitionPacket {
    pub const TYPE_NAME: &'static str = "MetricDefinition";
    const VERSION: u32 = 1;

    pub fn new(name: &str, unit: Option<&str>, columns: Vec<MetricColumn>) -> Self {
        MetricDefinitionPacket {
            id: Guid::generate(),
            name: name.to_string(),
            unit: unit.map(str::to_string),
            columns,
        }
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::new(MetricDefinitionPacket {
            id: Guid::ZERO,
            name: String::new(),
            unit: None,
            columns: Vec::new(),
        })
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn columns(&self) -> &[MetricColumn] {
        &self.columns
    }

    /// Per-instance schema for samples of this metric: the fixed identity
    /// and timestamp fields followed by one field per value column.
    pub fn sample_definition(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(MetricSamplePacket::TYPE_NAME, MetricSamplePacket::VERSION);
        def.set_dynamic(self.name.clone());
        def.require(Self::TYPE_NAME);
        def.add_field("metric_id", FieldType::Guid);
        def.add_field("timestamp", FieldType::Timestamp);
        for column in &self.columns {
            def.add_field(column.name.clone(), column.kind.field_type());
        }
        def
    }
}

impl Packet for MetricDefinitionPacket {
    fn describe(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
        def.set_cacheable();
        def.add_field("id", FieldType::Guid);
        def.add_field("name", FieldType::String);
        def.add_field("unit", FieldType::String);
        def.add_field("column_names", FieldType::StringArray);
        def.add_field("column_kinds", FieldType::StringArray);
        def
    }

    fn write_fields(
        &self,
        _definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("id", FieldValue::Guid(self.id))?;
        record.insert("name", FieldValue::String(Some(self.name.clone())))?;
        record.insert("unit", FieldValue::String(self.unit.clone()))?;
        record.insert(
            "column_names",
            FieldValue::StringArray(self.columns.iter().map(|c| c.name.clone()).collect()),
        )?;
        record.insert(
            "column_kinds",
            FieldValue::StringArray(
                self.columns
                    .iter()
                    .map(|c| c.kind.label().to_string())
                    .collect(),
            ),
        )
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            1 => {
                self.id = record.get_guid("id")?;
                self.name = record
                    .get_string("name")?
                    .unwrap_or_default()
                    .to_string();
                self.unit = record.get_string("unit")?.map(str::to_string);

                let names = record.get_string_array("column_names")?;
                let kinds = record.get_string_array("column_kinds")?;
                if names.len() != kinds.len() {
                    return Err(PacketError::InvalidData {
                        reason: format!(
                            "metric {} has {} column names but {} kinds",
                            self.name,
                            names.len(),
                            kinds.len()
                        ),
                    });
                }
                self.columns = names
                    .iter()
                    .zip(kinds)
                    .map(|(name, kind)| {
                        Ok(MetricColumn {
                            name: name.clone(),
                            kind: MetricColumnKind::from_label(kind)?,
                        })
                    })
                    .collect::<PacketResult<Vec<_>>>()?;
                Ok(())
            }
            version => Err(PacketError::UnsupportedVersion {
                type_name: Self::TYPE_NAME.into(),
                version,
            }),
        }
    }

    fn as_cacheable(&self) -> Option<&dyn CacheablePacket> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl CacheablePacket for MetricDefinitionPacket {
    fn packet_id(&self) -> Guid {
        self.id
    }

    fn as_packet(&self) -> &dyn Packet {
        self
    }
}

/// One sample of a metric. Dynamic: field count and types vary per metric,
/// not per concrete type.
#[derive(Debug, Default)]
pub struct MetricSamplePacket {
    definition: Option<Arc<MetricDefinitionPacket>>,
    metric_name: String,
    metric_id: Guid,
    timestamp: Timestamp,
    values: Vec<(String, MetricValue)>,
}

impl MetricSamplePacket {
    pub const TYPE_NAME: &'static str = "MetricSample";
    const VERSION: u32 = 1;

    /// Values must match the definition's columns in count and kind; a
    /// mismatch is rejected here, before serialization is attempted.
    pub fn new(
        definition: &Arc<MetricDefinitionPacket>,
        values: &[MetricValue],
    ) -> PacketResult<Self> {
        let columns = definition.columns();
        if values.len() != columns.len() {
            return Err(PacketError::InvalidData {
                reason: format!(
                    "metric {} expects {} values, got {}",
                    definition.name(),
                    columns.len(),
                    values.len()
                ),
            });
        }
        for (column, value) in columns.iter().zip(values) {
            if column.kind != value.kind() {
                return Err(PacketError::TypeMismatch {
                    name: column.name.clone(),
                    expected: column.kind.label(),
                    got: value.kind().label(),
                });
            }
        }
        Ok(MetricSamplePacket {
            definition: Some(definition.clone()),
            metric_name: definition.name().to_string(),
            metric_id: definition.id(),
            timestamp: Timestamp::now(),
            values: columns
                .iter()
                .zip(values)
                .map(|(c, v)| (c.name.clone(), *v))
                .collect(),
        })
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::<MetricSamplePacket>::default()
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn metric_id(&self) -> Guid {
        self.metric_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn values(&self) -> &[(String, MetricValue)] {
        &self.values
    }
}

impl Packet for MetricSamplePacket {
    fn describe(&self) -> PacketDefinition {
        match &self.definition {
            Some(definition) => definition.sample_definition(),
            // Blank instances exist only on the read path, where the
            // per-instance definition comes from the stream.
            None => {
                let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
                def.set_dynamic(self.metric_name.clone());
                def.add_field("metric_id", FieldType::Guid);
                def.add_field("timestamp", FieldType::Timestamp);
                def
            }
        }
    }

    fn write_fields(
        &self,
        _definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("metric_id", FieldValue::Guid(self.metric_id))?;
        record.insert("timestamp", FieldValue::Timestamp(self.timestamp))?;
        for (name, value) in &self.values {
            let field_value = match value {
                MetricValue::Integer(v) => FieldValue::Int64(*v),
                MetricValue::Float(v) => FieldValue::Double(*v),
            };
            record.insert(name.clone(), field_value)?;
        }
        Ok(())
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            1 => {
                self.metric_name = definition.dynamic_name().unwrap_or_default().to_string();
                self.metric_id = record.get_guid("metric_id")?;
                self.timestamp = record.get_timestamp("timestamp")?;
                self.values.clear();
                for field in definition.fields() {
                    match field.name() {
                        "metric_id" | "timestamp" => continue,
                        name => {
                            let value = match field.field_type() {
                                FieldType::Int64 => MetricValue::Integer(record.get_i64(name)?),
                                FieldType::Double => MetricValue::Float(record.get_f64(name)?),
                                other => {
                                    return Err(PacketError::TypeMismatch {
                                        name: name.to_string(),
                                        expected: "int64 or double",
                                        got: other.name(),
                                    })
                                }
                            };
                            self.values.push((name.to_string(), value));
                        }
                    }
                }
                Ok(())
            }
            version => Err(PacketError::UnsupportedVersion {
                type_name: Self::TYPE_NAME.into(),
                version,
            }),
        }
    }

    fn required_packets(&self) -> Vec<Arc<dyn CacheablePacket>> {
        match &self.definition {
            Some(definition) => vec![definition.clone() as Arc<dyn CacheablePacket>],
            None => Vec::new(),
        }
    }

    fn as_dynamic(&self) -> Option<&dyn DynamicPacket> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DynamicPacket for MetricSamplePacket {
    fn dynamic_type_name(&self) -> &str {
        &self.metric_name
    }
}
