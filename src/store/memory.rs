use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::RwLock;

use super::UserStore;
use crate::crypto::Salt;
use crate::error::StoreError;
use crate::record::CredentialRecord;

/// In-process [`UserStore`]; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.read().contains_key(user_id)
    }
}

impl UserStore for MemoryStore {
    fn save(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        match self.users.write().entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUser(user_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn load(&self, user_id: &str) -> Result<CredentialRecord, StoreError> {
        self.users
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    fn replace(&self, user_id: &str, record: CredentialRecord) -> Result<(), StoreError> {
        match self.users.write().get_mut(user_id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(user_id.to_string())),
        }
    }

    fn replace_if(
        &self,
        user_id: &str,
        expected: &Salt,
        record: CredentialRecord,
    ) -> Result<bool, StoreError> {
        match self.users.write().get_mut(user_id) {
            Some(existing) if existing.salt() == expected => {
                *existing = record;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(user_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Digest, KdfParams, Salt};

    fn record(fill: u8) -> CredentialRecord {
        CredentialRecord::new(
            KdfParams::default(),
            Salt::from_bytes([fill; 16]),
            Digest::from_bytes(vec![fill; 32]),
        )
        .unwrap()
    }

    #[test]
    fn create_new_store_works() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn save_and_load_works() {
        let store = MemoryStore::new();
        store.save("A", record(1)).unwrap();

        let loaded = store.load("A").unwrap();
        assert_eq!(loaded.salt().as_bytes(), &[1u8; 16]);
        assert_eq!(loaded.digest().as_bytes(), &[1u8; 32]);
        assert!(store.contains("A"));
    }

    #[test]
    fn save_existing_user_fails() {
        let store = MemoryStore::new();
        store.save("A", record(1)).unwrap();
        match store.save("A", record(2)) {
            Err(StoreError::DuplicateUser(u)) => assert_eq!(u, "A"),
            other => panic!("expected DuplicateUser, got: {other:?}"),
        }
        assert_eq!(store.load("A").unwrap().salt().as_bytes(), &[1u8; 16]);
    }

    #[test]
    fn load_missing_user_fails() {
        let store = MemoryStore::new();
        match store.load("A") {
            Err(StoreError::NotFound(u)) => assert_eq!(u, "A"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn replace_swaps_whole_record() {
        let store = MemoryStore::new();
        store.save("A", record(1)).unwrap();
        store.replace("A", record(2)).unwrap();

        let loaded = store.load("A").unwrap();
        assert_eq!(loaded.salt().as_bytes(), &[2u8; 16]);
        assert_eq!(loaded.digest().as_bytes(), &[2u8; 32]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_if_only_swaps_expected_record() {
        let store = MemoryStore::new();
        store.save("A", record(1)).unwrap();

        assert!(!store.replace_if("A", &Salt::from_bytes([9; 16]), record(2)).unwrap());
        assert_eq!(store.load("A").unwrap().salt().as_bytes(), &[1u8; 16]);

        assert!(store.replace_if("A", &Salt::from_bytes([1; 16]), record(2)).unwrap());
        assert_eq!(store.load("A").unwrap().salt().as_bytes(), &[2u8; 16]);

        assert!(matches!(
            store.replace_if("B", &Salt::from_bytes([1; 16]), record(3)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn replace_missing_user_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.replace("A", record(1)),
            Err(StoreError::NotFound(_))
        ));
    }
}
