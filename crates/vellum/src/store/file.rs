// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session fragment file format (.vlm)
//!
//! # Format Overview
//!
//! ```text
//! +---------------------------------------------------------+
//! |                 File Header (40 bytes)                   |
//! |  Magic (8) | FormatVersion (4) | ProtoMajor (1) |        |
//! |  ProtoMinor (1) | Flags (2) | SessionId (16) |           |
//! |  StartedTicks (8)                                        |
//! +---------------------------------------------------------+
//! |                 Packet stream (gzip)                     |
//! |  PacketWriter output, one self-describing packet after   |
//! |  another; the session header packet always comes first   |
//! +---------------------------------------------------------+
//! |                 CRC32 of compressed body (4)             |
//! +---------------------------------------------------------+
//! ```
//!
//! Compression is a transparent byte-sink/source decorator; it has no
//! interaction with the packet layer's caching or identity state.

use super::StoreError;
use crate::packet::{
    Guid, Packet, PacketReader, PacketWriter, ProtocolVersion, Timestamp,
};
use crate::records;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Magic bytes: "VLMSESS\0"
pub const MAGIC: [u8; 8] = [0x56, 0x4c, 0x4d, 0x53, 0x45, 0x53, 0x53, 0x00];

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Body is gzip-compressed.
pub const FLAG_GZIP: u16 = 0x0001;

/// File extension for session fragments.
pub const FRAGMENT_EXTENSION: &str = "vlm";

/// Fixed session file header.
#[derive(Debug, Clone)]
pub struct SessionFileHeader {
    pub version: u32,
    pub protocol: ProtocolVersion,
    pub flags: u16,
    pub session_id: Guid,
    pub started: Timestamp,
}

impl SessionFileHeader {
    pub const SIZE: usize = 40;

    pub fn new(session_id: Guid, started: Timestamp) -> Self {
        SessionFileHeader {
            version: FORMAT_VERSION,
            protocol: ProtocolVersion::CURRENT,
            flags: FLAG_GZIP,
            session_id,
            started,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u8(self.protocol.major)?;
        w.write_u8(self.protocol.minor)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_all(self.session_id.as_bytes())?;
        w.write_i64::<LittleEndian>(self.started.ticks())?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid session file magic",
            ));
        }

        let version = r.read_u32::<LittleEndian>()?;
        let protocol = ProtocolVersion {
            major: r.read_u8()?,
            minor: r.read_u8()?,
        };
        let flags = r.read_u16::<LittleEndian>()?;
        let mut id = [0u8; 16];
        r.read_exact(&mut id)?;
        let started = Timestamp::from_ticks(r.read_i64::<LittleEndian>()?);

        Ok(SessionFileHeader {
            version,
            protocol,
            flags,
            session_id: Guid::from_bytes(id),
            started,
        })
    }
}

/// Write sink that tracks a CRC32 and byte count of everything passing
/// through it.
struct Crc32Writer<W: Write> {
    inner: W,
    hasher: crc32fast::Hasher,
    bytes: u64,
}

impl<W: Write> Crc32Writer<W> {
    fn new(inner: W) -> Self {
        Crc32Writer {
            inner,
            hasher: crc32fast::Hasher::new(),
            bytes: 0,
        }
    }

    fn bytes(&self) -> u64 {
        self.bytes
    }

    fn into_parts(self) -> (W, u32, u64) {
        (self.inner, self.hasher.finalize(), self.bytes)
    }
}

impl<W: Write> Write for Crc32Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Summary returned when a fragment is closed.
#[derive(Debug, Clone)]
pub struct SessionFileSummary {
    pub path: PathBuf,
    pub packets: u64,
    pub compressed_bytes: u64,
}

/// Writes one session fragment: header, gzip packet stream, CRC trailer.
pub struct SessionFileWriter {
    packets: PacketWriter<GzEncoder<Crc32Writer<BufWriter<File>>>>,
    path: PathBuf,
    packet_count: u64,
}

impl SessionFileWriter {
    /// Create the fragment and write the session header packet as its first
    /// packet.
    pub fn create<P: AsRef<Path>>(
        path: P,
        header: &records::SessionHeaderPacket,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut sink = BufWriter::new(file);

        let file_header = SessionFileHeader::new(header.id(), header.started());
        file_header.write(&mut sink)?;

        let encoder = GzEncoder::new(Crc32Writer::new(sink), Compression::default());
        let mut writer = SessionFileWriter {
            packets: PacketWriter::new(encoder),
            path,
            packet_count: 0,
        };
        writer.write(header)?;
        log::debug!("opened session fragment {}", writer.path.display());
        Ok(writer)
    }

    pub fn write(&mut self, packet: &dyn Packet) -> Result<(), StoreError> {
        self.packets.write(packet)?;
        self.packet_count += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Compressed bytes flushed to disk so far; rotation triggers on this.
    pub fn compressed_bytes(&self) -> u64 {
        self.packets.sink().get_ref().bytes()
    }

    /// Finish the compression stream and append the CRC trailer.
    pub fn close(self) -> Result<SessionFileSummary, StoreError> {
        let encoder = self.packets.into_inner();
        let crc_writer = encoder.finish()?;
        let (mut sink, crc, bytes) = crc_writer.into_parts();
        sink.write_u32::<LittleEndian>(crc)?;
        sink.flush()?;
        log::debug!(
            "closed session fragment {} ({} packets, {} compressed bytes)",
            self.path.display(),
            self.packet_count,
            bytes
        );
        Ok(SessionFileSummary {
            path: self.path,
            packets: self.packet_count,
            compressed_bytes: bytes,
        })
    }
}

/// Reads one session fragment back as a packet stream. Factories for the
/// built-in record types are registered automatically; callers with custom
/// types add theirs through [`SessionFileReader::register`].
pub struct SessionFileReader {
    header: SessionFileHeader,
    packets: PacketReader<Box<dyn Read>>,
}

impl SessionFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let header = SessionFileHeader::read(&mut reader)?;

        if header.version != FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: FORMAT_VERSION,
                got: header.version,
            });
        }

        // Body and trailer: everything after the fixed header.
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        if body.len() < 4 {
            return Err(StoreError::InvalidFormat(
                "session file truncated before CRC trailer".into(),
            ));
        }
        let trailer = body.split_off(body.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if crc32fast::hash(&body) != expected {
            return Err(StoreError::CrcMismatch);
        }

        let source: Box<dyn Read> = if header.flags & FLAG_GZIP != 0 {
            Box::new(GzDecoder::new(io::Cursor::new(body)))
        } else {
            Box::new(io::Cursor::new(body))
        };
        let mut packets = PacketReader::with_version(source, header.protocol)?;
        records::register_builtins(&mut packets);

        Ok(SessionFileReader { header, packets })
    }

    pub fn header(&self) -> &SessionFileHeader {
        &self.header
    }

    pub fn session_id(&self) -> Guid {
        self.header.session_id
    }

    pub fn register(&mut self, type_name: &str, factory: crate::packet::PacketFactory) {
        self.packets.register(type_name, factory);
    }

    /// Next packet in the fragment, or `None` at the end.
    pub fn read_packet(&mut self) -> Result<Option<Arc<dyn Packet>>, StoreError> {
        Ok(self.packets.read()?)
    }

    /// Resolve an identity previously read from this fragment.
    pub fn lookup(&self, id: &Guid) -> Option<Arc<dyn Packet>> {
        self.packets.lookup(id)
    }
}
