// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session bundle archive format (.vlmz)
//!
//! # Format Overview
//!
//! ```text
//! +---------------------------------------------------------+
//! |                 Archive Header (24 bytes)                |
//! |  Magic (8) | Version (4) | EntryCount (4) | Created (8)  |
//! +---------------------------------------------------------+
//! |                 Entry 0                                  |
//! |  NameLen (2) | Name (var) | RawLen (8) | CompLen (8) |   |
//! |  CRC32 of raw (4) | gzip data (CompLen)                  |
//! +---------------------------------------------------------+
//! |                 Entry 1 ...                              |
//! +---------------------------------------------------------+
//! ```

use super::PackagerError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use vellum::Timestamp;

/// Magic bytes: "VLMZPKG\0"
pub const MAGIC: [u8; 8] = [0x56, 0x4c, 0x4d, 0x5a, 0x50, 0x4b, 0x47, 0x00];

/// Current archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// File extension for bundles.
pub const BUNDLE_EXTENSION: &str = "vlmz";

/// Per-entry description, returned by [`list_bundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub name: String,
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
}

/// Totals for a written bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleSummary {
    pub entries: usize,
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
}

/// Bundle the given files into one archive. Entry names are the source file
/// names without their directories.
pub fn write_bundle(archive: &Path, files: &[PathBuf]) -> Result<BundleSummary, PackagerError> {
    let mut sink = BufWriter::new(File::create(archive)?);

    sink.write_all(&MAGIC)?;
    sink.write_u32::<LittleEndian>(ARCHIVE_VERSION)?;
    sink.write_u32::<LittleEndian>(files.len() as u32)?;
    sink.write_i64::<LittleEndian>(Timestamp::now().ticks())?;

    let mut summary = BundleSummary {
        entries: files.len(),
        ..Default::default()
    };

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PackagerError::InvalidInput(format!("unusable path {}", path.display())))?;

        let raw = std::fs::read(path)?;
        let crc = crc32fast::hash(&raw);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;

        sink.write_u16::<LittleEndian>(name.len() as u16)?;
        sink.write_all(name.as_bytes())?;
        sink.write_u64::<LittleEndian>(raw.len() as u64)?;
        sink.write_u64::<LittleEndian>(compressed.len() as u64)?;
        sink.write_u32::<LittleEndian>(crc)?;
        sink.write_all(&compressed)?;

        summary.raw_bytes += raw.len() as u64;
        summary.compressed_bytes += compressed.len() as u64;
        tracing::debug!(
            entry = name,
            raw = raw.len(),
            compressed = compressed.len(),
            "bundled"
        );
    }

    sink.flush()?;
    Ok(summary)
}

struct EntryHeader {
    name: String,
    raw_len: u64,
    compressed_len: u64,
    crc: u32,
}

fn read_archive_header<R: Read>(source: &mut R) -> Result<u32, PackagerError> {
    let mut magic = [0u8; 8];
    source.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(PackagerError::InvalidFormat("bad archive magic".into()));
    }
    let version = source.read_u32::<LittleEndian>()?;
    if version != ARCHIVE_VERSION {
        return Err(PackagerError::VersionMismatch {
            expected: ARCHIVE_VERSION,
            got: version,
        });
    }
    let count = source.read_u32::<LittleEndian>()?;
    let _created = source.read_i64::<LittleEndian>()?;
    Ok(count)
}

fn read_entry_header<R: Read>(source: &mut R) -> Result<EntryHeader, PackagerError> {
    let name_len = source.read_u16::<LittleEndian>()? as usize;
    let mut name = vec![0u8; name_len];
    source.read_exact(&mut name)?;
    let name = String::from_utf8(name)
        .map_err(|_| PackagerError::InvalidFormat("entry name is not UTF-8".into()))?;
    Ok(EntryHeader {
        name,
        raw_len: source.read_u64::<LittleEndian>()?,
        compressed_len: source.read_u64::<LittleEndian>()?,
        crc: source.read_u32::<LittleEndian>()?,
    })
}

/// List the entries of a bundle without extracting.
pub fn list_bundle(archive: &Path) -> Result<Vec<BundleEntry>, PackagerError> {
    let mut source = BufReader::new(File::open(archive)?);
    let count = read_archive_header(&mut source)?;

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let header = read_entry_header(&mut source)?;
        io::copy(
            &mut source.by_ref().take(header.compressed_len),
            &mut io::sink(),
        )?;
        entries.push(BundleEntry {
            name: header.name,
            raw_bytes: header.raw_len,
            compressed_bytes: header.compressed_len,
        });
    }
    Ok(entries)
}

/// Extract every entry into `dest`, validating each CRC.
pub fn unbundle(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, PackagerError> {
    std::fs::create_dir_all(dest)?;
    let mut source = BufReader::new(File::open(archive)?);
    let count = read_archive_header(&mut source)?;

    let mut extracted = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let header = read_entry_header(&mut source)?;

        let mut raw = Vec::with_capacity(header.raw_len.min(1 << 20) as usize);
        GzDecoder::new(source.by_ref().take(header.compressed_len)).read_to_end(&mut raw)?;
        if raw.len() as u64 != header.raw_len {
            return Err(PackagerError::InvalidFormat(format!(
                "entry {} decompressed to {} bytes, expected {}",
                header.name,
                raw.len(),
                header.raw_len
            )));
        }
        if crc32fast::hash(&raw) != header.crc {
            return Err(PackagerError::CrcMismatch { name: header.name });
        }

        let path = dest.join(&header.name);
        std::fs::write(&path, &raw)?;
        extracted.push(path);
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed_files(dir: &Path) -> Vec<PathBuf> {
        let a = dir.join("session_0000.vlm");
        let b = dir.join("session_0001.vlm");
        std::fs::write(&a, vec![0xabu8; 4096]).expect("write a");
        std::fs::write(&b, b"fragment two").expect("write b");
        vec![a, b]
    }

    #[test]
    fn test_bundle_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let files = seed_files(dir.path());
        let archive = dir.path().join("bundle.vlmz");

        let summary = write_bundle(&archive, &files).expect("bundle");
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.raw_bytes, 4096 + 12);

        let entries = list_bundle(&archive).expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "session_0000.vlm");
        assert_eq!(entries[0].raw_bytes, 4096);

        let out = dir.path().join("out");
        let extracted = unbundle(&archive, &out).expect("unbundle");
        assert_eq!(extracted.len(), 2);
        assert_eq!(
            std::fs::read(&extracted[0]).expect("read"),
            vec![0xabu8; 4096]
        );
        assert_eq!(std::fs::read(&extracted[1]).expect("read"), b"fragment two");
    }

    #[test]
    fn test_corrupt_entry_fails_crc() {
        let dir = tempdir().expect("tempdir");
        let files = seed_files(dir.path());
        let archive = dir.path().join("bundle.vlmz");
        write_bundle(&archive, &files).expect("bundle");

        // Flip a byte inside the first entry's compressed data.
        let mut bytes = std::fs::read(&archive).expect("read archive");
        let data_start = 24 + 2 + "session_0000.vlm".len() + 8 + 8 + 4;
        bytes[data_start + 10] ^= 0xff;
        std::fs::write(&archive, &bytes).expect("rewrite");

        let out = dir.path().join("out");
        let err = unbundle(&archive, &out).unwrap_err();
        // Either the gzip stream or the CRC notices, both are fatal.
        assert!(matches!(
            err,
            PackagerError::CrcMismatch { .. } | PackagerError::Io(_) | PackagerError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempdir().expect("tempdir");
        let archive = dir.path().join("not_a_bundle.vlmz");
        std::fs::write(&archive, vec![0u8; 64]).expect("write");
        let err = list_bundle(&archive).unwrap_err();
        assert!(matches!(err, PackagerError::InvalidFormat(_)));
    }
}
