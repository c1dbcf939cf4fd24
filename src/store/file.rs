use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::UserStore;
use crate::crypto::Salt;
use crate::error::StoreError;
use crate::format;
use crate::record::CredentialRecord;
use crate::storage::Storage;

/// On-disk shape: user id -> base64 encoded record.
#[derive(Serialize, Deserialize, Debug, Default)]
struct Document {
    users: BTreeMap<String, String>,
}

/// [`UserStore`] persisted as a JSON document.
///
/// Every mutation rewrites the document atomically. Mutations within one
/// process are serialized; concurrent writers from other processes are not
/// coordinated.
#[derive(Debug)]
pub struct FileStore {
    storage: Storage,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            storage: Storage::new(path),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.storage.path()
    }

    /// Ids of all stored users, sorted.
    pub fn users(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_document()?.users.into_keys().collect())
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        match self.storage.read()? {
            Some(data) => serde_json::from_slice(&data)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path().display()))),
            None => Ok(Document::default()),
        }
    }

    fn write_document(&self, doc: &Document) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(doc)
            .map_err(|e| StoreError::Corrupt(format!("cannot serialize store: {e}")))?;
        self.storage.write(&data)
    }
}

impl UserStore for FileStore {
    fn save(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.read_document()?;

        if doc.users.contains_key(user_id) {
            return Err(StoreError::DuplicateUser(user_id.to_string()));
        }
        doc.users
            .insert(user_id.to_string(), format::encode_text(&record));
        self.write_document(&doc)
    }

    fn load(&self, user_id: &str) -> Result<CredentialRecord, StoreError> {
        let doc = self.read_document()?;
        let text = doc
            .users
            .get(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;

        format::decode_text(text)
            .map_err(|e| StoreError::Corrupt(format!("record for '{user_id}': {e}")))
    }

    fn replace(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.read_document()?;

        match doc.users.get_mut(user_id) {
            Some(slot) => *slot = format::encode_text(&record),
            None => return Err(StoreError::NotFound(user_id.to_string())),
        }
        self.write_document(&doc)
    }

    fn replace_if(
        &self,
        user_id: &str,
        expected: &Salt,
        record: CredentialRecord,
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.read_document()?;

        let slot = doc
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        let current = format::decode_text(slot)
            .map_err(|e| StoreError::Corrupt(format!("record for '{user_id}': {e}")))?;
        if current.salt() != expected {
            return Ok(false);
        }

        *slot = format::encode_text(&record);
        self.write_document(&doc)?;
        Ok(true)
    }
}
