//! Record format v1.
//!
//! ```text
//! MAGIC (4) | VERSION (1) | MEM_COST (4) | TIME_COST (4) | PARALLELISM (4) | OUTPUT_LEN (4) | SALT (16) | DIGEST (OUTPUT_LEN)
//! ```
//!
//! All integers are little endian.

use super::{MAGIC, MAGIC_LEN, VER_LEN, malformed};
use crate::crypto::{Digest, KdfParams, SALT_LEN, Salt};
use crate::error::Result;
use crate::record::CredentialRecord;

/// Current record format version.
pub const VERSION_V1: u8 = 1;

const MEM_LEN: usize = 4;
const TIME_LEN: usize = 4;
const PAR_LEN: usize = 4;
const OUT_LEN: usize = 4;

const HEADER_LEN: usize = MAGIC_LEN + VER_LEN + MEM_LEN + TIME_LEN + PAR_LEN + OUT_LEN + SALT_LEN;

fn read_u32(data: &[u8], offset: &mut usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[*offset..*offset + 4]);
    *offset += 4;
    u32::from_le_bytes(buf)
}

/// Parses a v1 record.
///
/// # Errors
///
/// Returns an error if the input is too short, carries invalid parameters,
/// or the digest length disagrees with the recorded output length.
pub fn parse(data: &[u8]) -> Result<CredentialRecord> {
    if data.len() < HEADER_LEN {
        return Err(malformed("record too short for v1"));
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let mem_cost = read_u32(data, &mut offset);
    let time_cost = read_u32(data, &mut offset);
    let parallelism = read_u32(data, &mut offset);
    let output_len = read_u32(data, &mut offset);

    let kdf = KdfParams::new(mem_cost, time_cost, parallelism, output_len)
        .map_err(|e| malformed(&format!("invalid recorded parameters: {e}")))?;

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data[offset..offset + SALT_LEN]);
    offset += SALT_LEN;

    let digest = &data[offset..];
    if digest.len() != kdf.output_len() {
        return Err(malformed("digest length does not match recorded output length"));
    }

    CredentialRecord::new(kdf, Salt::from_bytes(salt), Digest::from_bytes(digest.to_vec()))
}

/// Serializes a record to v1 bytes.
pub fn serialize(record: &CredentialRecord) -> Vec<u8> {
    let kdf = record.params();
    let mut buf = Vec::with_capacity(HEADER_LEN + record.digest().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);

    buf.extend_from_slice(&kdf.mem_cost_kib().to_le_bytes());
    buf.extend_from_slice(&kdf.time_cost().to_le_bytes());
    buf.extend_from_slice(&kdf.parallelism().to_le_bytes());
    buf.extend_from_slice(&(kdf.output_len() as u32).to_le_bytes());

    buf.extend_from_slice(record.salt().as_bytes());
    buf.extend_from_slice(record.digest().as_bytes());

    buf
}
