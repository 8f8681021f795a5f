//! Shared fixture builders for on-disk SqPack test installs
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const SQPACK_MAGIC: [u8; 8] = *b"SqPack\0\0";
pub const UNCOMPRESSED_SENTINEL: u32 = 32_000;

/// Pack a dat file id and byte offset into an index entry's data field.
///
/// Offsets are stored in 8-byte units with the low four bits reserved for
/// flags, so records must sit on 128-byte boundaries.
pub fn pack_location(dat_id: u8, offset: u64) -> u32 {
    assert_eq!(offset % 128, 0, "record offsets must be 128-byte aligned");
    (offset / 8) as u32 | (u32::from(dat_id) << 1)
}

fn build_index_common(entry_bytes: &[u8], entry_total: u32, data_file_count: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&SQPACK_MAGIC);
    bytes.push(0); // win32
    bytes.extend_from_slice(&[0; 3]);
    bytes.extend_from_slice(&24u32.to_le_bytes()); // header size
    bytes.extend_from_slice(&1u32.to_le_bytes()); // version
    bytes.extend_from_slice(&2u32.to_le_bytes()); // index kind

    bytes.extend_from_slice(&84u32.to_le_bytes()); // index header size
    bytes.extend_from_slice(&1u32.to_le_bytes()); // version
    bytes.extend_from_slice(&108u32.to_le_bytes()); // index data offset
    bytes.extend_from_slice(&entry_total.to_le_bytes());
    bytes.extend_from_slice(&[0; 64]);
    bytes.extend_from_slice(&data_file_count.to_le_bytes());
    assert_eq!(bytes.len(), 108);

    bytes.extend_from_slice(entry_bytes);
    bytes
}

/// Serialize an index file with 16-byte wide-hash entries.
pub fn build_index(entries: &[(u64, u32)], data_file_count: u32) -> Vec<u8> {
    let mut entry_bytes = Vec::new();
    for &(hash, data) in entries {
        entry_bytes.extend_from_slice(&hash.to_le_bytes());
        entry_bytes.extend_from_slice(&data.to_le_bytes());
        entry_bytes.extend_from_slice(&0u32.to_le_bytes());
    }
    build_index_common(&entry_bytes, entries.len() as u32 * 16, data_file_count)
}

/// Serialize an index2 file with 8-byte full-path-hash entries.
pub fn build_index2(entries: &[(u32, u32)], data_file_count: u32) -> Vec<u8> {
    let mut entry_bytes = Vec::new();
    for &(hash, data) in entries {
        entry_bytes.extend_from_slice(&hash.to_le_bytes());
        entry_bytes.extend_from_slice(&data.to_le_bytes());
    }
    build_index_common(&entry_bytes, entries.len() as u32 * 8, data_file_count)
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn compressed_block(payload: &[u8]) -> Vec<u8> {
    let compressed = deflate(payload);
    let mut block = Vec::new();
    block.extend_from_slice(&16u32.to_le_bytes());
    block.extend_from_slice(&0u32.to_le_bytes());
    block.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    block.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    block.extend_from_slice(&compressed);
    block
}

/// Serialize a standard record framing `payloads` as one block each.
pub fn build_standard_record(payloads: &[&[u8]]) -> Vec<u8> {
    let blocks: Vec<Vec<u8>> = payloads.iter().map(|p| compressed_block(p)).collect();
    let raw: usize = payloads.iter().map(|p| p.len()).sum();
    let header_size = 24 + 8 * payloads.len() as u32;

    let mut record = Vec::new();
    record.extend_from_slice(&header_size.to_le_bytes());
    record.extend_from_slice(&2u32.to_le_bytes()); // standard
    record.extend_from_slice(&(raw as u32).to_le_bytes());
    record.extend_from_slice(&[0; 8]);
    record.extend_from_slice(&(payloads.len() as u32).to_le_bytes());

    let mut offset = 0u32;
    for (block, payload) in blocks.iter().zip(payloads) {
        record.extend_from_slice(&offset.to_le_bytes());
        record.extend_from_slice(&(block.len() as u16).to_le_bytes());
        record.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        offset += block.len() as u32;
    }
    for block in &blocks {
        record.extend_from_slice(block);
    }
    record
}

/// Write a dat file whose records sit at the given 128-byte aligned offsets.
pub fn write_dat_file(path: &Path, records: &[(u64, Vec<u8>)]) {
    let total = records
        .iter()
        .map(|(offset, record)| *offset as usize + record.len())
        .max()
        .unwrap_or(0);
    let mut bytes = vec![0u8; total];
    for (offset, record) in records {
        let start = *offset as usize;
        bytes[start..start + record.len()].copy_from_slice(record);
    }
    fs::write(path, bytes).unwrap();
}
