// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Thread reference record, deduplicated per stream by the identity cache.
//!
//! Many log events on one thread share a single `ThreadInfoPacket`; the
//! session store keeps an explicit per-session map from thread key to the
//! shared instance (never a process-global).

use crate::packet::{
    CacheablePacket, FieldType, FieldValue, Guid, Packet, PacketDefinition, PacketError,
    PacketResult, SerializedRecord, Timestamp,
};
use std::any::Any;
use std::cell::Cell;
use std::sync::atomic::{AtomicI32, Ordering};

static NEXT_THREAD_KEY: AtomicI32 = AtomicI32::new(1);

thread_local! {
    static THREAD_KEY: Cell<i32> = const { Cell::new(0) };
}

/// Small, stable per-thread numeric key for the lifetime of the process.
pub fn current_thread_key() -> i32 {
    THREAD_KEY.with(|slot| {
        let key = slot.get();
        if key != 0 {
            return key;
        }
        let key = NEXT_THREAD_KEY.fetch_add(1, Ordering::Relaxed);
        slot.set(key);
        key
    })
}

#[derive(Debug, Clone)]
pub struct ThreadInfoPacket {
    id: Guid,
    thread_key: i32,
    name: Option<String>,
    observed: Timestamp,
}

impl ThreadInfoPacket {
    pub const TYPE_NAME: &'static str = "ThreadInfo";
    const VERSION: u32 = 1;

    pub fn new(thread_key: i32, name: Option<&str>) -> Self {
        ThreadInfoPacket {
            id: Guid::generate(),
            thread_key,
            name: name.map(str::to_string),
            observed: Timestamp::now(),
        }
    }

    /// Snapshot the calling thread.
    pub fn for_current_thread() -> Self {
        let current = std::thread::current();
        Self::new(current_thread_key(), current.name())
    }

    pub fn factory() -> Box<dyn Packet> {
        Box::new(ThreadInfoPacket {
            id: Guid::ZERO,
            thread_key: 0,
            name: None,
            observed: Timestamp::default(),
        })
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn thread_key(&self) -> i32 {
        self.thread_key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn observed(&self) -> Timestamp {
        self.observed
    }
}

impl Packet for ThreadInfoPacket {
    fn describe(&self) -> PacketDefinition {
        let mut def = PacketDefinition::new(Self::TYPE_NAME, Self::VERSION);
        def.set_cacheable();
        def.add_field("id", FieldType::Guid);
        def.add_field("thread_key", FieldType::Int32);
        def.add_field("name", FieldType::String);
        def.add_field("observed", FieldType::Timestamp);
        def
    }

    fn write_fields(
        &self,
        _definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()> {
        record.insert("id", FieldValue::Guid(self.id))?;
        record.insert("thread_key", FieldValue::Int32(self.thread_key))?;
        record.insert("name", FieldValue::String(self.name.clone()))?;
        record.insert("observed", FieldValue::Timestamp(self.observed))
    }

    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()> {
        match definition.version() {
            1 => {
                self.id = record.get_guid("id")?;
                self.thread_key = record.get_i32("thread_key")?;
                self.name = record.get_string("name")?.map(str::to_string);
                self.observed = record.get_timestamp("observed")?;
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

impl CacheablePacket for ThreadInfoPacket {
    fn packet_id(&self) -> Guid {
        self.id
    }

    fn as_packet(&self) -> &dyn Packet {
        self
    }
}
