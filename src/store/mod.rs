//! Persistence boundary for credential records.
//!
//! The credential core never touches storage directly; it goes through
//! [`UserStore`]. [`MemoryStore`] backs tests and demos, [`FileStore`] keeps
//! records on disk.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::crypto::Salt;
use crate::error::StoreError;
use crate::record::CredentialRecord;

/// Keyed storage of one [`CredentialRecord`] per user.
///
/// Records are written and read as a whole; salt and digest are never stored
/// or returned separately.
pub trait UserStore: Send + Sync {
    /// Persist a record for a new user.
    ///
    /// Fails with [`StoreError::DuplicateUser`] if the user already exists.
    fn save(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError>;

    /// Fetch the record for `user_id`, or [`StoreError::NotFound`].
    fn load(&self, user_id: &str) -> Result<CredentialRecord, StoreError>;

    /// Swap an existing user's record for a new one.
    ///
    /// Fails with [`StoreError::NotFound`] if the user does not exist.
    fn replace(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError>;

    /// Swap the record only while the stored one still has salt `expected`.
    ///
    /// Returns `Ok(false)` and leaves the store untouched if the record was
    /// replaced since it was read. Check and write happen under one lock.
    fn replace_if(
        &self,
        user_id: &str,
        expected: &Salt,
        record: CredentialRecord,
    ) -> Result<bool, StoreError>;
}

impl<S: UserStore + ?Sized> UserStore for std::sync::Arc<S> {
    fn save(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        (**self).save(user_id, record)
    }

    fn load(&self, user_id: &str) -> Result<CredentialRecord, StoreError> {
        (**self).load(user_id)
    }

    fn replace(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        (**self).replace(user_id, record)
    }

    fn replace_if(
        &self,
        user_id: &str,
        expected: &Salt,
        record: CredentialRecord,
    ) -> Result<bool, StoreError> {
        (**self).replace_if(user_id, expected, record)
    }
}
