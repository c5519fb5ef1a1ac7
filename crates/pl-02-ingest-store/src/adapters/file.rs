//! File-backed key-value store.
//!
//! The whole map lives in memory and is rewritten to disk on every mutation
//! via temp file + fsync + rename, so a crash leaves either the old or the
//! new file and never a torn one.
//!
//! On-disk format: `[key_len:u32 LE][key][value_len:u32 LE][value]...`

use super::memory::scan;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{KeyValueStore, ScanResult};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Durable single-file store.
#[derive(Debug)]
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, creating it empty if the file is absent.
    ///
    /// A truncated or otherwise unreadable file is an error; the log is never
    /// silently reset.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = Self::decode(&bytes)?;
                info!(
                    "[pl-02] 💾 Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[pl-02] 📁 No existing ingest file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
        let mut data = BTreeMap::new();
        let mut cursor = 0;

        while cursor < bytes.len() {
            let key = read_chunk(bytes, &mut cursor)?;
            let value = read_chunk(bytes, &mut cursor)?;
            data.insert(key, value);
        }

        Ok(data)
    }

    fn encode(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (key, value) in data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }
        bytes
    }

    fn save(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&Self::encode(data))?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Apply `mutate` to a copy, persist it, then swap it in.
    fn commit<F>(&mut self, mutate: F) -> Result<(), KVStoreError>
    where
        F: FnOnce(&mut BTreeMap<Vec<u8>, Vec<u8>>),
    {
        let mut next = self.data.clone();
        mutate(&mut next);
        self.save(&next)?;
        self.data = next;
        Ok(())
    }
}

fn read_chunk(bytes: &[u8], cursor: &mut usize) -> Result<Vec<u8>, KVStoreError> {
    let corrupt = |what: &str, at: usize| KVStoreError::CorruptionError {
        message: format!("truncated {} at offset {}", what, at),
    };

    let len_end = *cursor + 4;
    let len_bytes: [u8; 4] = bytes
        .get(*cursor..len_end)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| corrupt("length prefix", *cursor))?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let end = len_end + len;
    let chunk = bytes
        .get(len_end..end)
        .ok_or_else(|| corrupt("record", len_end))?
        .to_vec();
    *cursor = end;
    Ok(chunk)
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.commit(|data| {
            data.insert(key.to_vec(), value.to_vec());
        })
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan(&self.data, prefix))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
