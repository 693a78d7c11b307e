// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased field-value container used between a packet and the codec.
//!
//! A `SerializedRecord` is created fresh for each write or read and discarded
//! once the packet contract consumes it. Each ancestor level gets its own
//! record linked through `parent`, so field names only need to be unique
//! within one level.

use super::codec::FieldValue;
use super::guid::Guid;
use super::time::{TickDuration, Timestamp};
use super::{PacketError, PacketResult};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SerializedRecord {
    fields: Vec<(String, FieldValue)>,
    parent: Option<Box<SerializedRecord>>,
}

impl SerializedRecord {
    pub fn new() -> Self {
        SerializedRecord::default()
    }

    /// Add a field at this level. Names are unique per level.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> PacketResult<()> {
        let name = name.into();
        if self.fields.iter().any(|(n, _)| *n == name) {
            return Err(PacketError::DuplicateField { name });
        }
        self.fields.push((name, value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> PacketResult<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| PacketError::FieldNotFound { name: name.into() })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn set_parent(&mut self, parent: SerializedRecord) {
        self.parent = Some(Box::new(parent));
    }

    pub fn parent(&self) -> Option<&SerializedRecord> {
        self.parent.as_deref()
    }

    pub fn get_bool(&self, name: &str) -> PacketResult<bool> {
        match self.get(name)? {
            FieldValue::Bool(v) => Ok(*v),
            other => Err(mismatch(name, "bool", other)),
        }
    }

    pub fn get_i32(&self, name: &str) -> PacketResult<i32> {
        match self.get(name)? {
            FieldValue::Int32(v) => Ok(*v),
            other => Err(mismatch(name, "int32", other)),
        }
    }

    pub fn get_i64(&self, name: &str) -> PacketResult<i64> {
        match self.get(name)? {
            FieldValue::Int64(v) => Ok(*v),
            other => Err(mismatch(name, "int64", other)),
        }
    }

    pub fn get_f64(&self, name: &str) -> PacketResult<f64> {
        match self.get(name)? {
            FieldValue::Double(v) => Ok(*v),
            other => Err(mismatch(name, "double", other)),
        }
    }

    pub fn get_string(&self, name: &str) -> PacketResult<Option<&str>> {
        match self.get(name)? {
            FieldValue::String(v) => Ok(v.as_deref()),
            other => Err(mismatch(name, "string", other)),
        }
    }

    pub fn get_string_array(&self, name: &str) -> PacketResult<&[String]> {
        match self.get(name)? {
            FieldValue::StringArray(v) => Ok(v),
            other => Err(mismatch(name, "string[]", other)),
        }
    }

    pub fn get_guid(&self, name: &str) -> PacketResult<Guid> {
        match self.get(name)? {
            FieldValue::Guid(v) => Ok(*v),
            other => Err(mismatch(name, "guid", other)),
        }
    }

    pub fn get_timestamp(&self, name: &str) -> PacketResult<Timestamp> {
        match self.get(name)? {
            FieldValue::Timestamp(v) => Ok(*v),
            other => Err(mismatch(name, "timestamp", other)),
        }
    }

    pub fn get_duration(&self, name: &str) -> PacketResult<TickDuration> {
        match self.get(name)? {
            FieldValue::Duration(v) => Ok(*v),
            other => Err(mismatch(name, "duration", other)),
        }
    }
}

fn mismatch(name: &str, expected: &'static str, got: &FieldValue) -> PacketError {
    PacketError::TypeMismatch {
        name: name.into(),
        expected,
        got: got.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_typed_get() {
        let mut record = SerializedRecord::new();
        record
            .insert("severity", FieldValue::Int32(3))
            .expect("insert");
        record
            .insert("message", FieldValue::String(Some("boot".into())))
            .expect("insert");

        assert_eq!(record.get_i32("severity").expect("get"), 3);
        assert_eq!(record.get_string("message").expect("get"), Some("boot"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected_per_level() {
        let mut record = SerializedRecord::new();
        record.insert("id", FieldValue::Int32(1)).expect("insert");
        let err = record.insert("id", FieldValue::Int32(2)).unwrap_err();
        assert!(matches!(err, PacketError::DuplicateField { .. }));
    }

    #[test]
    fn test_parent_level_may_reuse_names() {
        let mut parent = SerializedRecord::new();
        parent
            .insert("timestamp", FieldValue::Int64(1))
            .expect("insert");

        let mut child = SerializedRecord::new();
        child
            .insert("timestamp", FieldValue::Int64(2))
            .expect("insert");
        child.set_parent(parent);

        assert_eq!(child.get_i64("timestamp").expect("child level"), 2);
        assert_eq!(
            child
                .parent()
                .expect("parent")
                .get_i64("timestamp")
                .expect("parent level"),
            1
        );
    }

    #[test]
    fn test_missing_field() {
        let record = SerializedRecord::new();
        let err = record.get("absent").unwrap_err();
        assert!(matches!(err, PacketError::FieldNotFound { .. }));
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let mut record = SerializedRecord::new();
        record
            .insert("count", FieldValue::String(None))
            .expect("insert");
        let err = record.get_i32("count").unwrap_err();
        match err {
            PacketError::TypeMismatch {
                name,
                expected,
                got,
            } => {
                assert_eq!(name, "count");
                assert_eq!(expected, "int32");
                assert_eq!(got, "string");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_field_order_preserved() {
        let mut record = SerializedRecord::new();
        for name in ["a", "b", "c"] {
            record.insert(name, FieldValue::Bool(true)).expect("insert");
        }
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
