// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session header record: identity and provenance of one recorded session.
//!
//! Version history: version 1 shipped without the environment string;
//! version 2 added it. `read_fields` handles both so old session files stay
//! readable.

use crate::packet::{
    FieldType, FieldValue, Guid, Packet, PacketDefinition, PacketError, PacketResult,
    SerializedRecord, Timestamp,
};
use std::any::Any;

#[derive(Debug, Clone)]
pub struct SessionHeaderPacket {
    id: Guid,
    started: Timestamp,
    product: String,
    application: String,
    agent_version: String,
    host_name: String,
    os_description: String,
    environment: Option<String>,
}

impl SessionHeaderPacket {
    pub const TYPE_NAME: &'static str = "SessionHeader";
    const VERSION: u32 = 2;

    pub fn new(product: &str, application: &str) -> Self {
        SessionHeaderPacket {
            id: Guid::generate(),
            started: Timestamp::now(),
            product: product.to_string(),
            application: application.to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            host_name: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
            os_description: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            environment: None,
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::new(SessionHeaderPacket {
            id: Guid::ZERO,
            started: Timestamp::default(),
            product: String::new(),
            application: String::new(),
            agent_version: String::new(),
            host_name: String::new(),
            os_description: String::new(),
            environment: None,
        })
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn started(&self) -> Timestamp {
        self.started
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn agent_version(&self) -> &str {
        &self.agent_version
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn os_description(&self) -> &str {
        &self.os_description
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }
}

impl Packet for SessionHeaderPacket {
    fn describe(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
        def.add_field("id", FieldType::Guid);
        def.add_field("started", FieldType::Timestamp);
        def.add_field("product", FieldType::String);
        def.add_field("application", FieldType::String);
        def.add_field("agent_version", FieldType::String);
        def.add_field("host_name", FieldType::String);
        def.add_field("os_description", FieldType::String);
        def.add_field("environment", FieldType::String);
        def
    }

    fn write_fields(
        &self,
        _definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("id", FieldValue::Guid(self.id))?;
        record.insert("started", FieldValue::Timestamp(self.started))?;
        record.insert("product", FieldValue::String(Some(self.product.clone())))?;
        record.insert(
            "application",
            FieldValue::String(Some(self.application.clone())),
        )?;
        record.insert(
            "agent_version",
            FieldValue::String(Some(self.agent_version.clone())),
        )?;
        record.insert("host_name", FieldValue::String(Some(self.host_name.clone())))?;
        record.insert(
            "os_description",
            FieldValue::String(Some(self.os_description.clone())),
        )?;
        record.insert("environment", FieldValue::String(self.environment.clone()))
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            version @ (1 | 2) => {
                self.id = record.get_guid("id")?;
                self.started = record.get_timestamp("started")?;
                self.product = required(record, "product")?;
                self.application = required(record, "application")?;
                self.agent_version = required(record, "agent_version")?;
                self.host_name = required(record, "host_name")?;
                self.os_description = required(record, "os_description")?;
                self.environment = if version >= 2 {
                    record.get_string("environment")?.map(str::to_string)
                } else {
                    None
                };
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

fn required(record: &SerializedRecord, name: &str) -> PacketResult<String> {
    record
        .get_string(name)?
        .map(str::to_string)
        .ok_or_else(|| PacketError::InvalidData {
            reason: format!("session header field {} is null", name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{FieldReader, FieldWriter, PacketReader, PacketWriter};

    #[test]
    fn test_roundtrip_current_version() {
        let header = SessionHeaderPacket::new("Vellum", "test-harness").with_environment("staging");

        let mut buf = Vec::new();
        PacketWriter::new(&mut buf).write(&header).expect("write");

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(SessionHeaderPacket::TYPE_NAME, SessionHeaderPacket::factory);
        let packet = reader.read().expect("read").expect("present");
        let decoded = packet
            .as_any()
            .downcast_ref::<SessionHeaderPacket>()
            .expect("a SessionHeaderPacket");
        assert_eq!(decoded.id(), header.id());
        assert_eq!(decoded.product(), "Vellum");
        assert_eq!(decoded.application(), "test-harness");
        assert_eq!(decoded.environment(), Some("staging"));
    }

    #[test]
    fn test_reads_version_one_layout() {
        // Hand-build a version-1 stream: same fields minus "environment".
        let header = SessionHeaderPacket::new("Vellum", "legacy-app");
        let mut v1_def = PacketDefinition::new(SessionHeaderPacket::TYPE_NAME, 1);
        for (name, field_type) in [
            ("id", FieldType::Guid),
            ("started", FieldType::Timestamp),
            ("product", FieldType::String),
            ("application", FieldType::String),
            ("agent_version", FieldType::String),
            ("host_name", FieldType::String),
            ("os_description", FieldType::String),
        ] {
            v1_def.add_field(name, field_type);
        }

        let mut buf = Vec::new();
        let mut writer = FieldWriter::new(&mut buf);
        writer.write_guid(&header.id()).expect("id");
        writer.write_timestamp(header.started()).expect("started");
        for value in [
            header.product(),
            header.application(),
            header.agent_version(),
            header.host_name(),
            header.os_description(),
        ] {
            writer.write_string(Some(value)).expect("string");
        }

        let mut record = SerializedRecord::new();
        let mut field_reader = FieldReader::new(buf.as_slice());
        for field in v1_def.fields() {
            let value = field_reader.read_value(field.field_type()).expect("value");
            record.insert(field.name(), value).expect("insert");
        }

        let mut decoded = SessionHeaderPacket::factory();
        decoded.read_fields(&v1_def, &record).expect("v1 read");
        let decoded = decoded
            .as_any()
            .downcast_ref::<SessionHeaderPacket>()
            .expect("a SessionHeaderPacket")
            .clone();
        assert_eq!(decoded.product(), "Vellum");
        assert_eq!(decoded.environment(), None);
    }

    #[test]
    fn test_future_version_rejected() {
        let def = PacketDefinition::new(SessionHeaderPacket::TYPE_NAME, 3);
        let record = SerializedRecord::new();
        let mut blank = SessionHeaderPacket::factory();
        let err = blank.read_fields(&def, &record).unwrap_err();
        assert!(matches!(
            err,
            PacketError::UnsupportedVersion { version: 3, .. }
        ));
    }
}
