use super::SALT_LEN;
use crate::error::{Error, Result};
use getrandom::fill;

/// Per-credential random salt.
///
/// Not secret, but it must be stored next to the digest it produced and
/// never reused for another credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Salt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|e| Error::EntropySource(e.to_string()))
}

/// Generate a fresh salt from the OS random source.
///
/// There is no fallback: if the OS generator fails, the error is returned.
pub fn generate_salt() -> Result<Salt> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(Salt(salt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn salt_has_fixed_length() {
        let salt = generate_salt().unwrap();
        assert_eq!(salt.as_bytes().len(), SALT_LEN);
        assert_eq!(salt.as_ref().len(), 16);
    }

    #[test]
    fn salts_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_salt().unwrap()));
        }
    }

    #[test]
    fn salt_is_not_all_zero() {
        // 2^-128 chance of a false failure
        let salt = generate_salt().unwrap();
        assert_ne!(salt.as_bytes(), &[0u8; SALT_LEN]);
    }
}
