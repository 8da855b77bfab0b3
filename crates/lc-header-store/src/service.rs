//! Bucket layout over a raw key-value store.

use parking_lot::Mutex;

use crate::domain::StoreError;
use crate::ports::{HeaderStore, KeyValueStore};

const HEADER_BUCKET: &[u8] = b"blockheaders/";
const LAST_HEADER_KEY: &[u8] = b"lastblockheader";

/// [`HeaderStore`] over any [`KeyValueStore`], shareable across tasks.
pub struct KvHeaderStore<S: KeyValueStore> {
    kv: Mutex<S>,
}

impl<S: KeyValueStore> KvHeaderStore<S> {
    /// Wrap a key-value store.
    pub fn new(kv: S) -> Self {
        Self { kv: Mutex::new(kv) }
    }

    fn header_key(hash: &[u8; 32]) -> Vec<u8> {
        let mut key = Vec::with_capacity(HEADER_BUCKET.len() + 32);
        key.extend_from_slice(HEADER_BUCKET);
        key.extend_from_slice(hash);
        key
    }
}

impl<S: KeyValueStore> HeaderStore for KvHeaderStore<S> {
    fn put_header(&self, hash: &[u8; 32], encoded: &[u8]) -> Result<(), StoreError> {
        self.kv.lock().put(&Self::header_key(hash), encoded)
    }

    fn get_header(&self, hash: &[u8; 32]) -> Result<Option<Vec<u8>>, StoreError> {
        self.kv.lock().get(&Self::header_key(hash))
    }

    fn delete_header(&self, hash: &[u8; 32]) -> Result<(), StoreError> {
        self.kv.lock().delete(&Self::header_key(hash))
    }

    fn put_last(&self, encoded: &[u8]) -> Result<(), StoreError> {
        let mut kv = self.kv.lock();
        // Single slot: clear before writing.
        kv.delete(LAST_HEADER_KEY)?;
        kv.put(LAST_HEADER_KEY, encoded)
    }

    fn get_last(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.kv.lock().get(LAST_HEADER_KEY)
    }
}
