use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::StoreError;
use crate::ports::KeyValueStore;

/// File-backed key-value store.
///
/// The whole map is rewritten on every mutation through a temp file and an
/// atomic rename. Record format: `[key_len:u32][key][value_len:u32][value]`,
/// lengths little-endian. An exclusive `fs2` lock on `<path>.lock` is held for
/// the lifetime of the store.
pub struct FileBackedKVStore {
    data: HashMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
    _lock: File,
}

impl FileBackedKVStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// - `Locked` if another process holds the store
    /// - `Corruption` if an existing file is truncated mid-record
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked { path: lock_path })?;

        let data = match File::open(&path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)?;
                Self::parse(&path, &bytes)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "[lc-store] opened {} with {} keys",
            path.display(),
            data.len()
        );

        Ok(Self {
            data,
            path,
            _lock: lock,
        })
    }

    fn parse(path: &Path, bytes: &[u8]) -> Result<HashMap<Vec<u8>, Vec<u8>>, StoreError> {
        let corrupt = |message: &str| StoreError::Corruption {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        let mut data = HashMap::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let (key, tail) = take_record(rest).ok_or_else(|| corrupt("truncated key"))?;
            let (value, tail) = take_record(tail).ok_or_else(|| corrupt("truncated value"))?;
            data.insert(key.to_vec(), value.to_vec());
            rest = tail;
        }
        Ok(data)
    }

    fn save(&self) -> Result<(), StoreError> {
        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Split one length-prefixed record off the front of `bytes`.
fn take_record(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let len_bytes: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let body = bytes.get(4..4 + len)?;
    Some((body, &bytes[4 + len..]))
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        self.save()
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        if self.data.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
