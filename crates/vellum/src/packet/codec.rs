// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field-level codec: primitive values to/from a sequential byte stream.
//!
//! # Integer encoding
//!
//! Signed integers use a variable-length form keyed on magnitude. The lead
//! byte carries a continuation bit (0x80), a sign bit (0x40), and 6 data
//! bits; every following byte carries a continuation bit and 7 data bits.
//! Size classes for 32-bit values:
//!
//! ```text
//! [0, 63]                        1 byte    [-63, -1]                      1 byte
//! [64, 8_191]                    2 bytes   [-8_191, -64]                  2 bytes
//! [8_192, 1_048_575]             3 bytes   [-1_048_575, -8_192]           3 bytes
//! [1_048_576, 134_217_727]       4 bytes   [-134_217_727, -1_048_576]     4 bytes
//! [134_217_728, 2_147_483_647]   5 bytes   [-2_147_483_648, -134_217_728] 5 bytes
//! ```
//!
//! 64-bit values extend the progression to 10 bytes at the extremes.
//!
//! # Double encoding
//!
//! A marker byte selects the smallest applicable form: `0` exact +0.0,
//! `1` exact integer (varint), `2` scale byte + varint mantissa with
//! value = mantissa * 2^-scale, `3` raw little-endian IEEE-754 (8 bytes).
//! Every finite double round-trips bit-for-bit; the raw form is the
//! unconditional fallback (and the only one that can express -0.0).
//!
//! # Strings
//!
//! Length+1 prefix: `0` is null, `1` is the empty string, `n` is `n - 1`
//! UTF-8 bytes. Null and empty are distinct and each smaller than any
//! non-empty string. No cross-value deduplication happens here; repeated
//! shared objects are deduplicated one layer up by the identity cache.

use super::guid::Guid;
use super::time::{TickDuration, Timestamp};
use super::{PacketError, PacketResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Protocol version in effect for a codec instance. Encoding rules are
/// applied per the version supplied at construction so older streams stay
/// readable unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const CURRENT: ProtocolVersion = ProtocolVersion { major: 1, minor: 0 };

    fn check_readable(self) -> PacketResult<Self> {
        if self.major > Self::CURRENT.major {
            return Err(PacketError::UnsupportedProtocol {
                major: self.major,
                minor: self.minor,
            });
        }
        Ok(self)
    }
}

/// Tagged union over every value a field can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(Option<String>),
    StringArray(Vec<String>),
    Guid(Guid),
    Timestamp(Timestamp),
    Duration(TickDuration),
}

impl FieldValue {
    /// The tag this value carries.
    pub fn field_type(&self) -> super::definition::FieldType {
        use super::definition::FieldType;
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Int32(_) => FieldType::Int32,
            FieldValue::Int64(_) => FieldType::Int64,
            FieldValue::Double(_) => FieldType::Double,
            FieldValue::String(_) => FieldType::String,
            FieldValue::StringArray(_) => FieldType::StringArray,
            FieldValue::Guid(_) => FieldType::Guid,
            FieldValue::Timestamp(_) => FieldType::Timestamp,
            FieldValue::Duration(_) => FieldType::Duration,
        }
    }

    /// Name of the carried tag, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int32(_) => "int32",
            FieldValue::Int64(_) => "int64",
            FieldValue::Double(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::StringArray(_) => "string[]",
            FieldValue::Guid(_) => "guid",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Duration(_) => "duration",
        }
    }
}

// Double form markers.
const DOUBLE_ZERO: u8 = 0;
const DOUBLE_INTEGER: u8 = 1;
const DOUBLE_SCALED: u8 = 2;
const DOUBLE_RAW: u8 = 3;

/// Writes field values to a byte sink, strictly sequentially.
pub struct FieldWriter<W: Write> {
    sink: W,
    version: ProtocolVersion,
}

impl<W: Write> FieldWriter<W> {
    pub fn new(sink: W) -> Self {
        FieldWriter {
            sink,
            version: ProtocolVersion::CURRENT,
        }
    }

    pub fn with_version(sink: W, version: ProtocolVersion) -> PacketResult<Self> {
        Ok(FieldWriter {
            sink,
            version: version.check_readable()?,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn flush(&mut self) -> PacketResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn write_bool(&mut self, value: bool) -> PacketResult<()> {
        self.sink.write_u8(u8::from(value))?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> PacketResult<()> {
        self.write_varint(value as i64)
    }

    pub fn write_i64(&mut self, value: i64) -> PacketResult<()> {
        self.write_varint(value)
    }

    pub fn write_f64(&mut self, value: f64) -> PacketResult<()> {
        if value.to_bits() == 0 {
            self.sink.write_u8(DOUBLE_ZERO)?;
            return Ok(());
        }
        if let Some((mantissa, scale)) = compact_double_form(value) {
            if scale == 0 {
                self.sink.write_u8(DOUBLE_INTEGER)?;
            } else {
                self.sink.write_u8(DOUBLE_SCALED)?;
                self.sink.write_u8(scale)?;
            }
            return self.write_varint(mantissa);
        }
        self.sink.write_u8(DOUBLE_RAW)?;
        self.sink.write_u64::<LittleEndian>(value.to_bits())?;
        Ok(())
    }

    pub fn write_string(&mut self, value: Option<&str>) -> PacketResult<()> {
        match value {
            None => self.write_uvarint(0),
            Some(s) => {
                self.write_uvarint(s.len() as u64 + 1)?;
                self.sink.write_all(s.as_bytes())?;
                Ok(())
            }
        }
    }

    pub fn write_string_array(&mut self, values: &[String]) -> PacketResult<()> {
        self.write_uvarint(values.len() as u64)?;
        for value in values {
            self.write_string(Some(value))?;
        }
        Ok(())
    }

    pub fn write_guid(&mut self, value: &Guid) -> PacketResult<()> {
        self.sink.write_all(value.as_bytes())?;
        Ok(())
    }

    pub fn write_timestamp(&mut self, value: Timestamp) -> PacketResult<()> {
        self.write_varint(value.ticks())
    }

    pub fn write_duration(&mut self, value: TickDuration) -> PacketResult<()> {
        self.write_varint(value.ticks())
    }

    pub fn write_value(&mut self, value: &FieldValue) -> PacketResult<()> {
        match value {
            FieldValue::Bool(v) => self.write_bool(*v),
            FieldValue::Int32(v) => self.write_i32(*v),
            FieldValue::Int64(v) => self.write_i64(*v),
            FieldValue::Double(v) => self.write_f64(*v),
            FieldValue::String(v) => self.write_string(v.as_deref()),
            FieldValue::StringArray(v) => self.write_string_array(v),
            FieldValue::Guid(v) => self.write_guid(v),
            FieldValue::Timestamp(v) => self.write_timestamp(*v),
            FieldValue::Duration(v) => self.write_duration(*v),
        }
    }

    fn write_varint(&mut self, value: i64) -> PacketResult<()> {
        let mut magnitude = value.unsigned_abs();
        let mut lead = (magnitude & 0x3f) as u8;
        if value < 0 {
            lead |= 0x40;
        }
        magnitude >>= 6;
        if magnitude != 0 {
            lead |= 0x80;
        }
        self.sink.write_u8(lead)?;
        while magnitude != 0 {
            let mut byte = (magnitude & 0x7f) as u8;
            magnitude >>= 7;
            if magnitude != 0 {
                byte |= 0x80;
            }
            self.sink.write_u8(byte)?;
        }
        Ok(())
    }

    pub(crate) fn write_uvarint(&mut self, mut value: u64) -> PacketResult<()> {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.sink.write_u8(byte)?;
            if value == 0 {
                return Ok(());
            }
        }
    }
}

/// Reads field values in the exact order they were written.
pub struct FieldReader<R: Read> {
    source: R,
    version: ProtocolVersion,
}

impl<R: Read> FieldReader<R> {
    pub fn new(source: R) -> Self {
        FieldReader {
            source,
            version: ProtocolVersion::CURRENT,
        }
    }

    pub fn with_version(source: R, version: ProtocolVersion) -> PacketResult<Self> {
        Ok(FieldReader {
            source,
            version: version.check_readable()?,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn read_bool(&mut self) -> PacketResult<bool> {
        match self.source.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(PacketError::InvalidData {
                reason: format!("invalid bool byte {:#04x}", other),
            }),
        }
    }

    pub fn read_i32(&mut self) -> PacketResult<i32> {
        let value = self.read_varint()?;
        i32::try_from(value).map_err(|_| PacketError::InvalidData {
            reason: format!("value {} out of range for int32", value),
        })
    }

    pub fn read_i64(&mut self) -> PacketResult<i64> {
        self.read_varint()
    }

    pub fn read_f64(&mut self) -> PacketResult<f64> {
        match self.source.read_u8()? {
            DOUBLE_ZERO => Ok(0.0),
            DOUBLE_INTEGER => Ok(self.read_varint()? as f64),
            DOUBLE_SCALED => {
                let scale = self.source.read_u8()?;
                let mantissa = self.read_varint()?;
                Ok(mantissa as f64 * 2.0f64.powi(-i32::from(scale)))
            }
            DOUBLE_RAW => Ok(f64::from_bits(self.source.read_u64::<LittleEndian>()?)),
            other => Err(PacketError::InvalidData {
                reason: format!("unknown double marker {:#04x}", other),
            }),
        }
    }

    pub fn read_string(&mut self) -> PacketResult<Option<String>> {
        let prefix = self.read_uvarint()?;
        if prefix == 0 {
            return Ok(None);
        }
        let len = (prefix - 1) as usize;
        let mut bytes = vec![0u8; len.min(4096)];
        let mut collected = Vec::new();
        let mut remaining = len;
        while remaining > 0 {
            let take = remaining.min(bytes.len());
            self.source.read_exact(&mut bytes[..take])?;
            collected.extend_from_slice(&bytes[..take]);
            remaining -= take;
        }
        String::from_utf8(collected)
            .map(Some)
            .map_err(|e| PacketError::InvalidData {
                reason: format!("invalid utf-8 in string: {}", e),
            })
    }

    pub fn read_string_array(&mut self) -> PacketResult<Vec<String>> {
        let count = self.read_uvarint()? as usize;
        let mut values = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            match self.read_string()? {
                Some(s) => values.push(s),
                None => {
                    return Err(PacketError::InvalidData {
                        reason: "null element in string array".into(),
                    })
                }
            }
        }
        Ok(values)
    }

    pub fn read_guid(&mut self) -> PacketResult<Guid> {
        let mut bytes = [0u8; 16];
        self.source.read_exact(&mut bytes)?;
        Ok(Guid::from_bytes(bytes))
    }

    pub fn read_timestamp(&mut self) -> PacketResult<Timestamp> {
        Ok(Timestamp::from_ticks(self.read_varint()?))
    }

    pub fn read_duration(&mut self) -> PacketResult<TickDuration> {
        TickDuration::from_ticks(self.read_varint()?)
    }

    fn read_varint(&mut self) -> PacketResult<i64> {
        let lead = self.source.read_u8()?;
        let negative = lead & 0x40 != 0;
        let mut magnitude = (lead & 0x3f) as u64;
        let mut more = lead & 0x80 != 0;
        let mut shift = 6u32;
        while more {
            let byte = self.source.read_u8()?;
            let chunk = (byte & 0x7f) as u64;
            if shift >= 64 || (chunk != 0 && chunk > (u64::MAX >> shift)) {
                return Err(PacketError::InvalidData {
                    reason: "varint magnitude overflow".into(),
                });
            }
            magnitude |= chunk << shift;
            shift += 7;
            more = byte & 0x80 != 0;
        }
        if negative {
            if magnitude > 1 << 63 {
                return Err(PacketError::InvalidData {
                    reason: "varint below int64 minimum".into(),
                });
            }
            Ok(magnitude.wrapping_neg() as i64)
        } else {
            if magnitude > i64::MAX as u64 {
                return Err(PacketError::InvalidData {
                    reason: "varint above int64 maximum".into(),
                });
            }
            Ok(magnitude as i64)
        }
    }

    pub(crate) fn read_uvarint(&mut self) -> PacketResult<u64> {
        match self.try_read_uvarint()? {
            Some(value) => Ok(value),
            None => Err(PacketError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "unexpected end of stream",
            ))),
        }
    }

    /// Like `read_uvarint`, but a clean end-of-stream before the first byte
    /// yields `None`. The stream reader uses this to detect the boundary
    /// between the last packet and the end of the stream.
    pub(crate) fn try_read_uvarint(&mut self) -> PacketResult<Option<u64>> {
        let mut first = [0u8; 1];
        loop {
            match self.source.read(&mut first) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PacketError::Io(e)),
            }
        }
        let mut value = (first[0] & 0x7f) as u64;
        let mut more = first[0] & 0x80 != 0;
        let mut shift = 7u32;
        while more {
            let byte = self.source.read_u8()?;
            let chunk = (byte & 0x7f) as u64;
            if shift >= 64 || (chunk != 0 && chunk > (u64::MAX >> shift)) {
                return Err(PacketError::InvalidData {
                    reason: "uvarint overflow".into(),
                });
            }
            value |= chunk << shift;
            shift += 7;
            more = byte & 0x80 != 0;
        }
        Ok(Some(value))
    }

    pub fn read_value(&mut self, field_type: super::definition::FieldType) -> PacketResult<FieldValue> {
        use super::definition::FieldType;
        Ok(match field_type {
            FieldType::Bool => FieldValue::Bool(self.read_bool()?),
            FieldType::Int32 => FieldValue::Int32(self.read_i32()?),
            FieldType::Int64 => FieldValue::Int64(self.read_i64()?),
            FieldType::Double => FieldValue::Double(self.read_f64()?),
            FieldType::String => FieldValue::String(self.read_string()?),
            FieldType::StringArray => FieldValue::StringArray(self.read_string_array()?),
            FieldType::Guid => FieldValue::Guid(self.read_guid()?),
            FieldType::Timestamp => FieldValue::Timestamp(self.read_timestamp()?),
            FieldType::Duration => FieldValue::Duration(self.read_duration()?),
        })
    }
}

/// Decompose a finite double into `(mantissa, scale)` with
/// `value = mantissa * 2^-scale`, provided the compact encoding is exact and
/// strictly smaller than the 9-byte raw form. `scale == 0` means the value is
/// an exact integer.
fn compact_double_form(value: f64) -> Option<(i64, u8)> {
    if !value.is_finite() {
        return None;
    }
    let bits = value.to_bits();
    if bits << 1 == 0 {
        // +0.0 is handled by the zero marker; -0.0 only survives raw.
        return None;
    }
    let negative = bits >> 63 == 1;
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    let (mut mantissa, mut exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    let trailing = mantissa.trailing_zeros();
    mantissa >>= trailing;
    exponent += trailing as i32;

    if exponent > 0 {
        // Fold the power of two back into the mantissa: exact integers.
        if exponent >= 63 || mantissa > (i64::MAX as u64) >> exponent {
            return None;
        }
        mantissa <<= exponent;
        exponent = 0;
    }
    if exponent < -127 {
        return None;
    }
    let scale = (-exponent) as u8;
    let signed = if negative {
        -(mantissa as i64)
    } else {
        mantissa as i64
    };

    let encoded = 1 + usize::from(scale > 0) + varint_len(signed);
    if encoded >= 9 {
        return None;
    }
    Some((signed, scale))
}

/// Encoded byte count of a signed varint.
pub(crate) fn varint_len(value: i64) -> usize {
    let mut magnitude = value.unsigned_abs() >> 6;
    let mut len = 1;
    while magnitude != 0 {
        magnitude >>= 7;
        len += 1;
    }
    len
}
