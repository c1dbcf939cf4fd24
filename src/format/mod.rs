//! Binary encoding of credential records.
//!
//! Version-aware parsing and serialization, plus a base64 text form for
//! stores that keep records in text documents.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{Error, Result};
use crate::record::CredentialRecord;

pub mod v1;

/// Magic bytes identifying an encoded credential record ("PBXR").
pub const MAGIC: &[u8; 4] = b"PBXR";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// Parses an encoded record, dispatching on its version byte.
///
/// # Errors
///
/// Returns [`Error::Record`] if:
/// - The input is too short
/// - The magic bytes are invalid
/// - The version is unsupported
/// - The body does not describe a valid record
pub fn decode(data: &[u8]) -> Result<CredentialRecord> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(malformed("record too short"));
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(malformed("invalid magic"));
    }

    match data[MAGIC_LEN] {
        v1::VERSION_V1 => v1::parse(data),
        v => Err(malformed(&format!("unsupported record version: {v}"))),
    }
}

/// Serializes a record in the current format version.
pub fn encode(record: &CredentialRecord) -> Vec<u8> {
    v1::serialize(record)
}

/// [`encode`] followed by standard base64.
pub fn encode_text(record: &CredentialRecord) -> String {
    STANDARD.encode(encode(record))
}

/// Inverse of [`encode_text`].
pub fn decode_text(text: &str) -> Result<CredentialRecord> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| malformed(&format!("invalid base64: {e}")))?;
    decode(&bytes)
}

pub(crate) fn malformed(msg: &str) -> Error {
    Error::Record(msg.to_string())
}
