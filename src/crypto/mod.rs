//! Cryptographic primitives for credential hashing.
//!
//! Provides salt generation, Argon2id key derivation, and the peppered
//! credential hasher built on top of them.

pub mod hasher;
pub mod kdf;
pub mod salt;

pub use hasher::{CredentialHasher, Digest, derive, verify};
pub use kdf::KdfParams;
pub use salt::{Salt, generate_salt};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Default length of the derived digest (32 bytes / 256 bits).
pub const DIGEST_LEN: usize = 32;
/// Smallest digest length accepted by [`KdfParams`].
pub const MIN_DIGEST_LEN: usize = 16;
/// Largest digest length accepted by [`KdfParams`].
pub const MAX_DIGEST_LEN: usize = 64;
/// Largest memory cost accepted by [`KdfParams`] (1 GiB), in KiB.
pub const MAX_MEM_COST_KIB: u32 = 1024 * 1024;
/// Largest time cost accepted by [`KdfParams`].
pub const MAX_TIME_COST: u32 = 32;
