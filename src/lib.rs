//! Salted, peppered Argon2id credential hashing.
//!
//! [`CredentialHasher`] derives and verifies digests; [`Credentials`] wires it
//! to a [`UserStore`] for registration, login and password changes.

pub mod crypto;
mod error;
pub mod format;
mod limiter;
pub mod pepper;
mod record;
mod storage;
pub mod store;

pub use crate::crypto::{CredentialHasher, Digest, KdfParams, Salt, generate_salt};
pub use crate::error::{Error, Result, StoreError};
pub use crate::limiter::{DerivationLimiter, Permit};
pub use crate::pepper::{EnvPepperSource, FilePepperSource, Pepper, PepperSource};
pub use crate::record::CredentialRecord;
pub use crate::storage::Storage;
pub use crate::store::{FileStore, MemoryStore, UserStore};

use directories::ProjectDirs;
use tracing::{debug, info, warn};

/// How often registration asks the OS for a salt before giving up.
pub const SALT_ATTEMPTS: usize = 3;

// Used only to spend the same time on unknown users as on known ones.
const DECOY_SALT: [u8; crypto::SALT_LEN] = [0x5a; crypto::SALT_LEN];

/// Registration and authentication on top of a [`UserStore`].
pub struct Credentials<S> {
    hasher: CredentialHasher,
    store: S,
    limiter: DerivationLimiter,
}

impl<S: UserStore> Credentials<S> {
    pub fn new(hasher: CredentialHasher, store: S) -> Self {
        Self {
            hasher,
            store,
            limiter: DerivationLimiter::default(),
        }
    }

    pub fn with_limiter(mut self, limiter: DerivationLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limiter(&self) -> &DerivationLimiter {
        &self.limiter
    }

    /// Create a credential for a new user.
    ///
    /// Nothing is persisted unless salt generation and derivation both succeed.
    pub fn register(&self, user_id: &str, password: &[u8]) -> Result<()> {
        let record = self.fresh_record(password)?;
        self.store.save(user_id, record)?;
        info!(user = user_id, "registered credential");
        Ok(())
    }

    /// `true` only if `user_id` exists and `password` matches.
    ///
    /// Unknown users, wrong passwords and store failures all return `false`.
    /// A successful login against a record made with weaker parameters
    /// re-derives it under the current ones.
    pub fn authenticate(&self, user_id: &str, password: &[u8]) -> bool {
        let record = match self.store.load(user_id) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                self.decoy_derivation(password);
                debug!(user = user_id, "authentication failed");
                return false;
            }
            Err(e) => {
                tracing::error!(user = user_id, error = %e, "credential store unavailable");
                return false;
            }
        };

        if !self.check(&record, password) {
            debug!(user = user_id, "authentication failed");
            return false;
        }

        if record.needs_rehash(self.hasher.params()) {
            if let Err(e) = self.rehash(user_id, &record, password) {
                warn!(user = user_id, error = %e, "could not upgrade credential parameters");
            }
        }

        debug!(user = user_id, "authentication succeeded");
        true
    }

    /// Replace a user's credential after checking the current password.
    ///
    /// Unknown users and wrong passwords both yield
    /// [`Error::InvalidCredentials`].
    pub fn change_password(&self, user_id: &str, current: &[u8], new: &[u8]) -> Result<()> {
        let record = match self.store.load(user_id) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                self.decoy_derivation(current);
                return Err(Error::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.check(&record, current) {
            return Err(Error::InvalidCredentials);
        }

        self.store.replace(user_id, self.fresh_record(new)?)?;
        info!(user = user_id, "password changed");
        Ok(())
    }

    fn check(&self, record: &CredentialRecord, password: &[u8]) -> bool {
        let _permit = self.limiter.acquire();
        self.hasher
            .verify_with(password, record.salt(), record.digest(), record.params())
    }

    // Only overwrites the record that was just verified; a concurrent
    // password change wins.
    fn rehash(&self, user_id: &str, verified: &CredentialRecord, password: &[u8]) -> Result<()> {
        let upgraded = self.fresh_record(password)?;
        if self.store.replace_if(user_id, verified.salt(), upgraded)? {
            info!(user = user_id, "credential re-derived with current parameters");
        } else {
            debug!(user = user_id, "credential changed during login, upgrade skipped");
        }
        Ok(())
    }

    fn fresh_record(&self, password: &[u8]) -> Result<CredentialRecord> {
        let salt = salt_with_retry(generate_salt)?;
        let digest = {
            let _permit = self.limiter.acquire();
            self.hasher.derive(password, &salt)?
        };
        CredentialRecord::new(self.hasher.params(), salt, digest)
    }

    fn decoy_derivation(&self, password: &[u8]) {
        let _permit = self.limiter.acquire();
        let _ = self.hasher.derive(password, &Salt::from_bytes(DECOY_SALT));
    }
}

fn salt_with_retry(mut generate: impl FnMut() -> Result<Salt>) -> Result<Salt> {
    let mut attempt = 1;
    loop {
        match generate() {
            Ok(salt) => return Ok(salt),
            Err(e) if attempt < SALT_ATTEMPTS => {
                warn!(attempt, error = %e, "salt generation failed, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Per-user data directory location of the credential store.
pub fn default_store_path() -> anyhow::Result<std::path::PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "pepperbox")
        .ok_or_else(|| anyhow::anyhow!("could not determine platform directories"))?;

    Ok(project_dirs.data_dir().join("users.json"))
}
