use argon2::{Algorithm, Argon2, Params, Version};

use super::{DIGEST_LEN, MAX_DIGEST_LEN, MAX_MEM_COST_KIB, MAX_TIME_COST, MIN_DIGEST_LEN};
use crate::error::{Error, Result};

/// Argon2id cost parameters.
///
/// Every record stores the parameters it was derived with, so changing the
/// defaults only affects new digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
    output_len: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 64 * 1024, // 64 MiB
            time_cost: 1,
            parallelism: 4,
            output_len: DIGEST_LEN as u32,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32, output_len: u32) -> Result<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
            output_len,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn output_len(&self) -> usize {
        self.output_len as usize
    }

    /// Also applied to parameters decoded from stored records.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_TIME_COST).contains(&self.time_cost) {
            return Err(invalid(&format!(
                "argon2 time cost must be between 1 and {MAX_TIME_COST}"
            )));
        }
        if !(1..=255).contains(&self.parallelism) {
            return Err(invalid("argon2 parallelism must be between 1 and 255"));
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return Err(invalid("argon2 memory cost must be at least 8 * parallelism"));
        }
        if self.mem_cost_kib > MAX_MEM_COST_KIB {
            return Err(invalid(&format!(
                "argon2 memory cost must not exceed {MAX_MEM_COST_KIB} KiB"
            )));
        }
        if !(MIN_DIGEST_LEN..=MAX_DIGEST_LEN).contains(&self.output_len()) {
            return Err(invalid(&format!(
                "digest length must be between {MIN_DIGEST_LEN} and {MAX_DIGEST_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// How many derivations fit into `available_kib` of memory at once.
    ///
    /// Never less than one, so a caller can always make progress.
    pub fn max_concurrent_derivations(&self, available_kib: u64) -> usize {
        let per_call = u64::from(self.mem_cost_kib.max(1));
        usize::try_from(available_kib / per_call)
            .unwrap_or(usize::MAX)
            .max(1)
    }
}

fn invalid(msg: &str) -> Error {
    Error::KdfParameter(msg.to_string())
}

/// Run Argon2id v1.3 over `input` and `salt`, filling `out`.
///
/// `out` must be exactly `kdf.output_len()` bytes long.
pub fn derive_raw(input: &[u8], salt: &[u8], kdf: KdfParams, out: &mut [u8]) -> Result<()> {
    kdf.validate()?;
    if out.len() != kdf.output_len() {
        return Err(invalid("output buffer does not match digest length"));
    }

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(kdf.output_len()),
    )
    .map_err(|e| Error::KdfParameter(format!("failed to construct Argon2 params: {e}")))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(input, salt, out)
        .map_err(|e| Error::KdfParameter(format!("argon2 key derivation failed: {e}")))
}

/// Cheap parameters for tests that do not depend on the cost.
#[cfg(test)]
pub(crate) fn test_params() -> KdfParams {
    KdfParams::new(256, 1, 4, DIGEST_LEN as u32).unwrap()
}
