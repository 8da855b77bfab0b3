//! Store ports.

use crate::domain::StoreError;

/// Raw key-value database.
///
/// Production: [`crate::FileBackedKVStore`]
/// Testing: [`crate::InMemoryKVStore`]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Header persistence as used by the synchronizer.
///
/// Values are encoded headers; the store never interprets them.
pub trait HeaderStore: Send + Sync {
    /// Store an encoded header under its hash.
    fn put_header(&self, hash: &[u8; 32], encoded: &[u8]) -> Result<(), StoreError>;

    /// Load an encoded header by hash.
    fn get_header(&self, hash: &[u8; 32]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove a header.
    fn delete_header(&self, hash: &[u8; 32]) -> Result<(), StoreError>;

    /// Replace the last-known-tip slot.
    fn put_last(&self, encoded: &[u8]) -> Result<(), StoreError>;

    /// Read the last-known-tip slot.
    fn get_last(&self) -> Result<Option<Vec<u8>>, StoreError>;
}
