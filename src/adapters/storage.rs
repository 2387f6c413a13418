use crate::domain::ports::Storage;
use crate::utils::error::{BackupError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for LocalStorage {
    async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BackupError::filesystem(&self.root, e))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        let full_path = self.root.join(path);
        match tokio::fs::create_dir(&full_path).await {
            Ok(()) => Ok(()),
            // 並行建立同一目錄時，已存在即視為成功
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(BackupError::filesystem(full_path, e)),
        }
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.root.join(path);
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| BackupError::filesystem(full_path, e))
    }
}
