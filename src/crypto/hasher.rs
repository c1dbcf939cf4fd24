use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::kdf::{KdfParams, derive_raw};
use super::salt::Salt;
use crate::error::{Error, Result};
use crate::pepper::Pepper;

/// Output of the key derivation; the only password-derived value that may be
/// persisted.
///
/// Deliberately not `PartialEq`: compare with [`ConstantTimeEq`].
#[derive(Clone)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ConstantTimeEq for Digest {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.as_slice().ct_eq(other.0.as_slice())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({} bytes)", self.0.len())
    }
}

/// Derives and verifies peppered password digests.
///
/// Holds no mutable state; share it freely between threads.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    pepper: Pepper,
    params: KdfParams,
}

impl CredentialHasher {
    /// Fails with [`Error::KdfParameter`] if `params` is not a usable
    /// Argon2id configuration.
    pub fn new(pepper: Pepper, params: KdfParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { pepper, params })
    }

    /// Parameters used for new digests.
    pub fn params(&self) -> KdfParams {
        self.params
    }

    pub fn derive(&self, password: &[u8], salt: &Salt) -> Result<Digest> {
        self.derive_with(password, salt, self.params)
    }

    /// Derive under an explicit parameter set, e.g. the one recorded with an
    /// older credential.
    pub fn derive_with(&self, password: &[u8], salt: &Salt, params: KdfParams) -> Result<Digest> {
        let input = self.peppered(password);
        let mut out = vec![0u8; params.output_len()];
        derive_raw(&input, salt.as_ref(), params, &mut out)?;
        Ok(Digest(out))
    }

    pub fn verify(&self, candidate: &[u8], salt: &Salt, digest: &Digest) -> bool {
        self.verify_with(candidate, salt, digest, self.params)
    }

    /// Recompute the digest for `candidate` and compare it in constant time.
    pub fn verify_with(
        &self,
        candidate: &[u8],
        salt: &Salt,
        digest: &Digest,
        params: KdfParams,
    ) -> bool {
        match self.derive_with(candidate, salt, params) {
            Ok(computed) => computed.ct_eq(digest).into(),
            Err(e) => {
                tracing::error!(error = %e, "derivation failed during verification");
                false
            }
        }
    }

    // password || pepper, in that order
    fn peppered(&self, password: &[u8]) -> Zeroizing<Vec<u8>> {
        let pepper = self.pepper.as_bytes();
        let mut input = Zeroizing::new(Vec::with_capacity(password.len() + pepper.len()));
        input.extend_from_slice(password);
        input.extend_from_slice(pepper);
        input
    }
}

/// Derive a digest for `password ∥ pepper` under the default parameters.
///
/// # Errors
///
/// An empty `pepper` is refused with [`Error::PepperSource`], the same as at
/// startup; argon2 failures surface as [`Error::KdfParameter`].
pub fn derive(password: &[u8], pepper: &[u8], salt: &Salt) -> Result<Digest> {
    let pepper = Pepper::new(pepper)?;
    CredentialHasher::new(pepper, KdfParams::default())?.derive(password, salt)
}

/// Verify `candidate` against a digest produced by [`derive`].
///
/// An empty `pepper` never verifies.
pub fn verify(candidate: &[u8], pepper: &[u8], salt: &Salt, digest: &Digest) -> bool {
    let hasher = Pepper::new(pepper)
        .and_then(|pepper| CredentialHasher::new(pepper, KdfParams::default()));
    match hasher {
        Ok(hasher) => hasher.verify(candidate, salt, digest),
        Err(Error::PepperSource(_)) => false,
        Err(e) => {
            tracing::error!(error = %e, "cannot build credential hasher");
            false
        }
    }
}
