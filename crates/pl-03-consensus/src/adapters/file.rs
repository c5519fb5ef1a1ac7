//! JSON file chain repository.
//!
//! Written via temp file + fsync + rename so a crash leaves the previous
//! chain intact.

use crate::domain::{ConsensusError, ConsensusResult, PersistedChain};
use crate::ports::ChainStateRepository;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileChainRepository {
    path: PathBuf,
}

impl FileChainRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_err(context: &str, path: &Path, e: std::io::Error) -> ConsensusError {
    ConsensusError::Persistence(format!("{} {}: {}", context, path.display(), e))
}

impl ChainStateRepository for FileChainRepository {
    fn load(&self) -> ConsensusResult<Option<PersistedChain>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("read", &self.path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ConsensusError::CorruptChain(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, chain: &PersistedChain) -> ConsensusResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| io_err("create", parent, e))?;
            }
        }

        let bytes = serde_json::to_vec(chain)
            .map_err(|e| ConsensusError::Persistence(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut file =
            std::fs::File::create(&temp_path).map_err(|e| io_err("create", &temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| io_err("write", &temp_path, e))?;
        file.sync_all().map_err(|e| io_err("sync", &temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| io_err("rename", &self.path, e))?;

        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
