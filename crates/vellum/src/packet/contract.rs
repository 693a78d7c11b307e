// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The record contract: the capability every persistable type implements,
//! plus the optional identity-caching and dynamic-schema capabilities.
//!
//! Dispatch is by the type tag carried in the stream header; ancestor and
//! component composition is explicit delegation through nested
//! sub-definitions, not subtype machinery.

use super::definition::PacketDefinition;
use super::guid::Guid;
use super::record::SerializedRecord;
use super::PacketResult;
use std::any::Any;
use std::sync::Arc;

/// Zero-argument factory producing a blank instance for the stream reader.
pub type PacketFactory = fn() -> Box<dyn Packet>;

/// Implemented by every persistable record type.
pub trait Packet: Any {
    /// Produce this type's schema. For a derived type, chain to the
    /// ancestor's `describe` first and nest its definition via
    /// [`PacketDefinition::set_ancestor`].
    fn describe(&self) -> PacketDefinition;

    /// Populate `record` from `self`. Ancestor fields go into a parent
    /// record level attached with [`SerializedRecord::set_parent`].
    fn write_fields(
        &self,
        definition: &PacketDefinition,
        record: &mut SerializedRecord,
    ) -> PacketResult<()>;

    /// Repopulate `self` from `record`, switching on `definition.version()`.
    /// Must fail with [`super::PacketError::UnsupportedVersion`] for any
    /// version it does not explicitly handle.
    fn read_fields(
        &mut self,
        definition: &PacketDefinition,
        record: &SerializedRecord,
    ) -> PacketResult<()>;

    /// Records that must be fully written to the stream before this one.
    fn required_packets(&self) -> Vec<Arc<dyn CacheablePacket>> {
        Vec::new()
    }

    /// Identity-caching capability, if this type has it.
    fn as_cacheable(&self) -> Option<&dyn CacheablePacket> {
        None
    }

    /// Dynamic-schema capability, if this type has it.
    fn as_dynamic(&self) -> Option<&dyn DynamicPacket> {
        None
    }

    /// Downcast support for consumers of `Arc<dyn Packet>`.
    fn as_any(&self) -> &dyn Any;
}

/// A record with a stable, process-unique identity. Within one stream such a
/// record is physically serialized at most once; later occurrences are
/// encoded as a back-reference to the identity.
pub trait CacheablePacket: Packet {
    fn packet_id(&self) -> Guid;

    /// Erased view for the stream writer; implement as `self`.
    fn as_packet(&self) -> &dyn Packet;
}

/// A record whose field set varies per instance. Its definition is written
/// alongside every instance; the discriminator associates each instance with
/// the adjacent definition rather than a type-wide cached one.
pub trait DynamicPacket: Packet {
    fn dynamic_type_name(&self) -> &str;
}
