use crate::crypto::{Digest, KdfParams, Salt};
use crate::error::{Error, Result};

/// Everything needed to verify one user's password later.
///
/// Salt, digest and the parameters that produced them travel together; a
/// password change replaces the whole record.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    params: KdfParams,
    salt: Salt,
    digest: Digest,
}

impl CredentialRecord {
    pub fn new(params: KdfParams, salt: Salt, digest: Digest) -> Result<Self> {
        params.validate()?;
        if digest.len() != params.output_len() {
            return Err(Error::Record(format!(
                "digest is {} bytes, parameters expect {}",
                digest.len(),
                params.output_len()
            )));
        }
        Ok(Self {
            params,
            salt,
            digest,
        })
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Whether re-deriving under `current` would be an upgrade.
    ///
    /// A record is never rewritten with a lower memory or time cost.
    pub fn needs_rehash(&self, current: KdfParams) -> bool {
        self.params != current
            && current.mem_cost_kib() >= self.params.mem_cost_kib()
            && current.time_cost() >= self.params.time_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_digest_length_mismatch() {
        let params = KdfParams::default();
        let result = CredentialRecord::new(
            params,
            Salt::from_bytes([0u8; 16]),
            Digest::from_bytes(vec![0u8; 16]),
        );
        assert!(matches!(result, Err(Error::Record(_))));
    }

    #[test]
    fn needs_rehash_compares_params() {
        let params = KdfParams::default();
        let record = CredentialRecord::new(
            params,
            Salt::from_bytes([0u8; 16]),
            Digest::from_bytes(vec![0u8; 32]),
        )
        .unwrap();

        assert!(!record.needs_rehash(params));
        assert!(record.needs_rehash(KdfParams::new(65536, 2, 4, 32).unwrap()));
        assert!(record.needs_rehash(KdfParams::new(131072, 1, 4, 32).unwrap()));
    }

    #[test]
    fn weaker_params_do_not_trigger_rehash() {
        let record = CredentialRecord::new(
            KdfParams::new(65536, 2, 4, 32).unwrap(),
            Salt::from_bytes([0u8; 16]),
            Digest::from_bytes(vec![0u8; 32]),
        )
        .unwrap();

        assert!(!record.needs_rehash(KdfParams::new(256, 2, 4, 32).unwrap()));
        assert!(!record.needs_rehash(KdfParams::new(131072, 1, 4, 32).unwrap()));
    }
}
