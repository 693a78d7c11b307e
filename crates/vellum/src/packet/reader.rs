// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream reader: mirrors the writer's bookkeeping to reconstruct the exact
//! polymorphic packet graph using only a type registry.
//!
//! Factories must be registered for every concrete type before the first
//! read; an unregistered type is a fatal error and the stream is considered
//! corrupt from that point on. Identity-cached packets come back as the same
//! shared instance for every occurrence of their identity.

use super::codec::{FieldReader, ProtocolVersion};
use super::contract::{Packet, PacketFactory};
use super::definition::{PacketDefinition, SubDefinitionKind};
use super::record::SerializedRecord;
use super::{Guid, PacketError, PacketResult};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

pub struct PacketReader<R: Read> {
    codec: FieldReader<R>,
    factories: HashMap<String, PacketFactory>,
    codes: HashMap<u64, String>,
    definitions: HashMap<String, PacketDefinition>,
    instances: HashMap<Guid, Arc<dyn Packet>>,
}

impl<R: Read> PacketReader<R> {
    pub fn new(source: R) -> Self {
        PacketReader {
            codec: FieldReader::new(source),
            factories: HashMap::new(),
            codes: HashMap::new(),
            definitions: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    pub fn with_version(source: R, version: ProtocolVersion) -> PacketResult<Self> {
        Ok(PacketReader {
            codec: FieldReader::with_version(source, version)?,
            factories: HashMap::new(),
            codes: HashMap::new(),
            definitions: HashMap::new(),
            instances: HashMap::new(),
        })
    }

    /// Register the factory for one concrete type. Must happen before any
    /// packet of that type is read.
    pub fn register(&mut self, type_name: impl Into<String>, factory: PacketFactory) {
        self.factories.insert(type_name.into(), factory);
    }

    /// Resolve an identity previously read from this stream.
    pub fn lookup(&self, id: &Guid) -> Option<Arc<dyn Packet>> {
        self.instances.get(id).cloned()
    }

    /// Read the next packet, or `None` at a clean end of stream.
    pub fn read(&mut self) -> PacketResult<Option<Arc<dyn Packet>>> {
        let code = match self.codec.try_read_uvarint()? {
            Some(code) => code,
            None => return Ok(None),
        };

        let first_occurrence = !self.codes.contains_key(&code);
        if first_occurrence {
            let definition = PacketDefinition::read(&mut self.codec)?;
            let type_name = definition.type_name().to_string();
            log::trace!("read definition for {} as code {}", type_name, code);
            self.codes.insert(code, type_name.clone());
            self.definitions.insert(type_name, definition);
        }
        let type_name = self.codes[&code].clone();

        let factory =
            self.factories
                .get(type_name.as_str())
                .copied()
                .ok_or(PacketError::UnknownType {
                    type_name: type_name.clone(),
                })?;
        let mut instance = factory();

        // Dynamic types carry their definition alongside every instance; the
        // first occurrence already read it as part of the type header.
        let definition = if !first_occurrence && instance.as_dynamic().is_some() {
            PacketDefinition::read(&mut self.codec)?
        } else {
            self.definitions
                .get(type_name.as_str())
                .cloned()
                .ok_or_else(|| PacketError::InvalidData {
                    reason: format!("no definition on stream for {}", type_name),
                })?
        };

        if instance.as_cacheable().is_some() {
            let id = self.codec.read_guid()?;
            if let Some(existing) = self.instances.get(&id) {
                log::trace!("resolved back-reference {} for {}", id, type_name);
                return Ok(Some(existing.clone()));
            }
            let record = self.read_record(&definition)?;
            instance.read_fields(&definition, &record)?;
            let shared: Arc<dyn Packet> = Arc::from(instance);
            self.instances.insert(id, shared.clone());
            return Ok(Some(shared));
        }

        let record = self.read_record(&definition)?;
        instance.read_fields(&definition, &record)?;
        Ok(Some(Arc::from(instance)))
    }

    /// Extract one record level: ancestor levels first into linked parent
    /// records, component fields into the owning level, then own fields.
    fn read_record(&mut self, definition: &PacketDefinition) -> PacketResult<SerializedRecord> {
        let mut record = SerializedRecord::new();
        for sub in definition.subs() {
            match sub.kind {
                SubDefinitionKind::Ancestor => {
                    let parent = self.read_record(&sub.definition)?;
                    record.set_parent(parent);
                }
                SubDefinitionKind::Component => {
                    self.read_record_into(&sub.definition, &mut record)?;
                }
            }
        }
        self.read_fields_into(definition, &mut record)?;
        Ok(record)
    }

    fn read_record_into(
        &mut self,
        definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        for sub in definition.subs() {
            match sub.kind {
                SubDefinitionKind::Ancestor => {
                    let parent = self.read_record(&sub.definition)?;
                    record.set_parent(parent);
                }
                SubDefinitionKind::Component => {
                    self.read_record_into(&sub.definition, record)?;
                }
            }
        }
        self.read_fields_into(definition, record)
    }

    fn read_fields_into(
        &mut self,
        definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        for field in definition.fields() {
            let value = self.codec.read_value(field.field_type())?;
            record.insert(field.name(), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::codec::FieldValue;
    use crate::packet::contract::CacheablePacket;
    use crate::packet::definition::FieldType;
    use crate::packet::writer::PacketWriter;
    use std::any::Any;

    // ------------------------------------------------------------------
    // Test packet types
    // ------------------------------------------------------------------

    /// One-field record, version 1.
    #[derive(Debug, Default, PartialEq)]
    struct Label {
        text: Option<String>,
    }

    impl Label {
        const TYPE_NAME: &'static str = "Label";

        fn new(text: &str) -> Self {
            Label {
                text: Some(text.to_string()),
            }
        }

        fn factory() -> Box<dyn Packet> {
            Box::<Label>::default()
        }
    }

    impl Packet for Label {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Self::TYPE_NAME, 1);
            def.add_field("text", FieldType::String);
            def
        }

        fn write_fields(
            &self,
            _definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("text", FieldValue::String(self.text.clone()))
        }

        fn read_fields(
            &mut self,
            definition: &PacketDefinition,
            record: &SerializedRecord,
        ) -> PacketResult<()> {
            match definition.version() {
                1 => {
                    self.text = record.get_string("text")?.map(str::to_string);
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

    /// Ancestor/descendant pair.
    #[derive(Debug, Default, PartialEq)]
    struct Stamp {
        sequence: i64,
    }

    impl Stamp {
        const TYPE_NAME: &'static str = "Stamp";
    }

    impl Packet for Stamp {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Self::TYPE_NAME, 1);
            def.add_field("sequence", FieldType::Int64);
            def
        }

        fn write_fields(
            &self,
            _definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("sequence", FieldValue::Int64(self.sequence))
        }

        fn read_fields(
            &mut self,
            definition: &PacketDefinition,
            record: &SerializedRecord,
        ) -> PacketResult<()> {
            match definition.version() {
                1 => {
                    self.sequence = record.get_i64("sequence")?;
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

    #[derive(Debug, Default, PartialEq)]
    struct StampedNote {
        stamp: Stamp,
        note: Option<String>,
    }

    impl StampedNote {
        const TYPE_NAME: &'static str = "StampedNote";

        fn factory() -> Box<dyn Packet> {
            Box::<StampedNote>::default()
        }
    }

    impl Packet for StampedNote {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Self::TYPE_NAME, 1);
            def.set_ancestor(self.stamp.describe());
            def.add_field("note", FieldType::String);
            def
        }

        fn write_fields(
            &self,
            definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("note", FieldValue::String(self.note.clone()))?;
            let ancestor = definition.ancestor().ok_or(PacketError::MissingParent {
                type_name: Self::TYPE_NAME.into(),
            })?;
            let mut parent = SerializedRecord::new();
            self.stamp.write_fields(ancestor, &mut parent)?;
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
                    self.note = record.get_string("note")?.map(str::to_string);
                    let ancestor = definition.ancestor().ok_or(PacketError::MissingParent {
                        type_name: Self::TYPE_NAME.into(),
                    })?;
                    let parent = record.parent().ok_or(PacketError::MissingParent {
                        type_name: Self::TYPE_NAME.into(),
                    })?;
                    self.stamp.read_fields(ancestor, parent)
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

    /// Identity-cacheable shared object.
    #[derive(Debug)]
    struct SharedTag {
        id: Guid,
        name: Option<String>,
    }

    impl SharedTag {
        const TYPE_NAME: &'static str = "SharedTag";

        fn new(name: &str) -> Self {
            SharedTag {
                id: Guid::generate(),
                name: Some(name.to_string()),
            }
        }

        fn factory() -> Box<dyn Packet> {
            Box::new(SharedTag {
                id: Guid::ZERO,
                name: None,
            })
        }
    }

    impl Packet for SharedTag {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Self::TYPE_NAME, 1);
            def.set_cacheable();
            def.add_field("id", FieldType::Guid);
            def.add_field("name", FieldType::String);
            def
        }

        fn write_fields(
            &self,
            _definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("id", FieldValue::Guid(self.id))?;
            record.insert("name", FieldValue::String(self.name.clone()))
        }

        fn read_fields(
            &mut self,
            definition: &PacketDefinition,
            record: &SerializedRecord,
        ) -> PacketResult<()> {
            match definition.version() {
                1 => {
                    self.id = record.get_guid("id")?;
                    self.name = record.get_string("name")?.map(str::to_string);
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

    impl CacheablePacket for SharedTag {
        fn packet_id(&self) -> Guid {
            self.id
        }

        fn as_packet(&self) -> &dyn Packet {
            self
        }
    }

    /// Record depending on a shared tag.
    #[derive(Debug, Default)]
    struct Tagged {
        tag: Option<Arc<SharedTag>>,
        tag_ref: Guid,
        payload: i32,
    }

    impl Tagged {
        const TYPE_NAME: &'static str = "Tagged";

        fn new(tag: &Arc<SharedTag>, payload: i32) -> Self {
            Tagged {
                tag: Some(tag.clone()),
                tag_ref: tag.id,
                payload,
            }
        }

        fn factory() -> Box<dyn Packet> {
            Box::<Tagged>::default()
        }
    }

    impl Packet for Tagged {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Self::TYPE_NAME, 1);
            def.add_field("tag_ref", FieldType::Guid);
            def.add_field("payload", FieldType::Int32);
            def.require(SharedTag::TYPE_NAME);
            def
        }

        fn write_fields(
            &self,
            _definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("tag_ref", FieldValue::Guid(self.tag_ref))?;
            record.insert("payload", FieldValue::Int32(self.payload))
        }

        fn read_fields(
            &mut self,
            definition: &PacketDefinition,
            record: &SerializedRecord,
        ) -> PacketResult<()> {
            match definition.version() {
                1 => {
                    self.tag_ref = record.get_guid("tag_ref")?;
                    self.payload = record.get_i32("payload")?;
                    Ok(())
                }
                version => Err(PacketError::UnsupportedVersion {
                    type_name: Self::TYPE_NAME.into(),
                    version,
                }),
            }
        }

        fn required_packets(&self) -> Vec<Arc<dyn CacheablePacket>> {
            match &self.tag {
                Some(tag) => vec![tag.clone() as Arc<dyn CacheablePacket>],
                None => Vec::new(),
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Version-1 writer shape for a type whose reader only knows version 1;
    /// used to provoke the unsupported-version error with a doctored stream.
    #[derive(Debug, Default)]
    struct FutureLabel;

    impl Packet for FutureLabel {
        fn describe(&self) -> PacketDefinition {
            let mut def = PacketDefinition::new(Label::TYPE_NAME, 7);
            def.add_field("text", FieldType::String);
            def
        }

        fn write_fields(
            &self,
            _definition: &PacketDefinition,
            record: &mut SerializedRecord,
        ) -> PacketResult<()> {
            record.insert("text", FieldValue::String(Some("from the future".into())))
        }

        fn read_fields(
            &mut self,
            _definition: &PacketDefinition,
            _record: &SerializedRecord,
        ) -> PacketResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[test]
    fn test_simple_record_roundtrip_with_schema_emitted_once() {
        let mut single = Vec::new();
        PacketWriter::new(&mut single)
            .write(&Label::new("alpha"))
            .expect("write");

        let mut triple = Vec::new();
        {
            let mut writer = PacketWriter::new(&mut triple);
            for _ in 0..3 {
                writer.write(&Label::new("alpha")).expect("write");
            }
        }

        // Instances two and three carry only code + body, so the stream
        // grows by exactly twice the body size: the schema region appears
        // exactly once.
        let body = (triple.len() - single.len()) / 2;
        assert_eq!(triple.len(), single.len() + 2 * body);
        assert!(single.len() > body, "first instance includes the schema");

        let mut reader = PacketReader::new(triple.as_slice());
        reader.register(Label::TYPE_NAME, Label::factory);
        for _ in 0..3 {
            let packet = reader.read().expect("read").expect("present");
            let label = packet.as_any().downcast_ref::<Label>().expect("a Label");
            assert_eq!(label.text.as_deref(), Some("alpha"));
        }
        assert!(reader.read().expect("clean end").is_none());
    }

    #[test]
    fn test_derived_record_ancestor_fields_first() {
        let note = StampedNote {
            stamp: Stamp { sequence: 99 },
            note: Some("derived".into()),
        };

        let mut buf = Vec::new();
        PacketWriter::new(&mut buf).write(&note).expect("write");

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(StampedNote::TYPE_NAME, StampedNote::factory);
        let packet = reader.read().expect("read").expect("present");
        let decoded = packet
            .as_any()
            .downcast_ref::<StampedNote>()
            .expect("a StampedNote");
        assert_eq!(decoded.stamp.sequence, 99);
        assert_eq!(decoded.note.as_deref(), Some("derived"));
    }

    #[test]
    fn test_shared_dependency_serialized_once_and_identity_preserved() {
        let tag = Arc::new(SharedTag::new("worker"));
        let first = Tagged::new(&tag, 1);
        let second = Tagged::new(&tag, 2);

        let mut buf = Vec::new();
        let mut writer = PacketWriter::new(&mut buf);
        writer.write(&first).expect("write first");
        writer.write(&second).expect("write second");

        // The tag name appears exactly once in the stream bytes: the second
        // dependency pass reduced to a back-reference.
        let needle = b"worker";
        let occurrences = buf
            .windows(needle.len())
            .filter(|window| window == needle)
            .count();
        assert_eq!(occurrences, 1, "dependency body must be written once");

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(SharedTag::TYPE_NAME, SharedTag::factory);
        reader.register(Tagged::TYPE_NAME, Tagged::factory);

        let tag_packet = reader.read().expect("read tag").expect("present");
        let first_packet = reader.read().expect("read first").expect("present");
        let second_packet = reader.read().expect("read second").expect("present");

        let first_decoded = first_packet.as_any().downcast_ref::<Tagged>().expect("Tagged");
        let second_decoded = second_packet.as_any().downcast_ref::<Tagged>().expect("Tagged");
        assert_eq!(first_decoded.payload, 1);
        assert_eq!(second_decoded.payload, 2);
        assert_eq!(first_decoded.tag_ref, second_decoded.tag_ref);

        // Both records resolve the same reconstructed instance.
        let via_first = reader.lookup(&first_decoded.tag_ref).expect("cached");
        let via_second = reader.lookup(&second_decoded.tag_ref).expect("cached");
        assert!(Arc::ptr_eq(&via_first, &via_second));
        assert!(Arc::ptr_eq(&via_first, &tag_packet));
        let tag_decoded = via_first.as_any().downcast_ref::<SharedTag>().expect("tag");
        assert_eq!(tag_decoded.name.as_deref(), Some("worker"));
    }

    #[test]
    fn test_cacheable_top_level_rewrite_is_back_reference() {
        let tag = SharedTag::new("repeat");

        let mut once = Vec::new();
        PacketWriter::new(&mut once).write(&tag).expect("write");

        let mut buf = Vec::new();
        {
            let mut writer = PacketWriter::new(&mut buf);
            writer.write(&tag).expect("write");
            writer.write(&tag).expect("write again");
        }
        // code + 16-byte identity, no body, no definition.
        assert_eq!(buf.len() - once.len(), 17);

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(SharedTag::TYPE_NAME, SharedTag::factory);
        let first = reader.read().expect("read").expect("present");
        let second = reader.read().expect("read").expect("present");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_composite_record_with_embedded_component() {
        // A record embedding another record type as a component rather than
        // an ancestor: the component's schema nests as a sub-definition and
        // its fields live at the owning level.
        #[derive(Debug, Default, PartialEq)]
        struct Bounds {
            low: i64,
            high: i64,
        }

        impl Packet for Bounds {
            fn describe(&self) -> PacketDefinition {
                let mut def = PacketDefinition::new("Bounds", 1);
                def.add_field("low", FieldType::Int64);
                def.add_field("high", FieldType::Int64);
                def
            }
            fn write_fields(
                &self,
                _definition: &PacketDefinition,
                record: &mut SerializedRecord,
            ) -> PacketResult<()> {
                record.insert("low", FieldValue::Int64(self.low))?;
                record.insert("high", FieldValue::Int64(self.high))
            }
            fn read_fields(
                &mut self,
                definition: &PacketDefinition,
                record: &SerializedRecord,
            ) -> PacketResult<()> {
                match definition.version() {
                    1 => {
                        self.low = record.get_i64("low")?;
                        self.high = record.get_i64("high")?;
                        Ok(())
                    }
                    version => Err(PacketError::UnsupportedVersion {
                        type_name: "Bounds".into(),
                        version,
                    }),
                }
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        #[derive(Debug, Default, PartialEq)]
        struct Gauge {
            bounds: Bounds,
            reading: i64,
        }

        impl Gauge {
            fn factory() -> Box<dyn Packet> {
                Box::<Gauge>::default()
            }
        }

        impl Packet for Gauge {
            fn describe(&self) -> PacketDefinition {
                let mut def = PacketDefinition::new("Gauge", 1);
                def.add_component(self.bounds.describe());
                def.add_field("reading", FieldType::Int64);
                def
            }
            fn write_fields(
                &self,
                definition: &PacketDefinition,
                record: &mut SerializedRecord,
            ) -> PacketResult<()> {
                // Component first, then own fields, matching declaration order.
                let component = &definition.subs()[0].definition;
                self.bounds.write_fields(component, record)?;
                record.insert("reading", FieldValue::Int64(self.reading))
            }
            fn read_fields(
                &mut self,
                definition: &PacketDefinition,
                record: &SerializedRecord,
            ) -> PacketResult<()> {
                match definition.version() {
                    1 => {
                        let component = &definition.subs()[0].definition;
                        self.bounds.read_fields(component, record)?;
                        self.reading = record.get_i64("reading")?;
                        Ok(())
                    }
                    version => Err(PacketError::UnsupportedVersion {
                        type_name: "Gauge".into(),
                        version,
                    }),
                }
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let gauge = Gauge {
            bounds: Bounds { low: -10, high: 90 },
            reading: 72,
        };
        let mut buf = Vec::new();
        PacketWriter::new(&mut buf).write(&gauge).expect("write");

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register("Gauge", Gauge::factory);
        let packet = reader.read().expect("read").expect("present");
        let decoded = packet.as_any().downcast_ref::<Gauge>().expect("a Gauge");
        assert_eq!(decoded, &gauge);
    }

    #[test]
    fn test_unregistered_type_is_fatal() {
        let mut buf = Vec::new();
        PacketWriter::new(&mut buf)
            .write(&Label::new("orphan"))
            .expect("write");

        let mut reader = PacketReader::new(buf.as_slice());
        let err = reader.read().err().unwrap();
        match err {
            PacketError::UnknownType { type_name } => assert_eq!(type_name, "Label"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        let mut buf = Vec::new();
        PacketWriter::new(&mut buf)
            .write(&FutureLabel)
            .expect("write");

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(Label::TYPE_NAME, Label::factory);
        let err = reader.read().err().unwrap();
        match err {
            PacketError::UnsupportedVersion { type_name, version } => {
                assert_eq!(type_name, "Label");
                assert_eq!(version, 7);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let mut buf = Vec::new();
        PacketWriter::new(&mut buf)
            .write(&Label::new("cut short"))
            .expect("write");
        buf.truncate(buf.len() - 3);

        let mut reader = PacketReader::new(buf.as_slice());
        reader.register(Label::TYPE_NAME, Label::factory);
        let err = reader.read().err().unwrap();
        assert!(matches!(err, PacketError::Io(_)));
    }

    #[test]
    fn test_type_mismatch_between_value_and_definition() {
        // A packet whose write_fields stores a different tag than described.
        #[derive(Debug, Default)]
        struct Liar;
        impl Packet for Liar {
            fn describe(&self) -> PacketDefinition {
                let mut def = PacketDefinition::new("Liar", 1);
                def.add_field("value", FieldType::Int32);
                def
            }
            fn write_fields(
                &self,
                _definition: &PacketDefinition,
                record: &mut SerializedRecord,
            ) -> PacketResult<()> {
                record.insert("value", FieldValue::String(Some("oops".into())))
            }
            fn read_fields(
                &mut self,
                _definition: &PacketDefinition,
                _record: &SerializedRecord,
            ) -> PacketResult<()> {
                Ok(())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let mut buf = Vec::new();
        let err = PacketWriter::new(&mut buf).write(&Liar).err().unwrap();
        assert!(matches!(err, PacketError::TypeMismatch { .. }));
    }
}
