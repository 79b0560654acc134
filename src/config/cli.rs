use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Image cache folder on the local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 快取資料夾不存在時建立
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.base_path.is_dir() {
            tracing::info!(
                "📁 image cache folder '{}' does not exist. Creating it.",
                self.base_path.display()
            );
            fs::create_dir_all(&self.base_path)?;
        }
        Ok(())
    }
}

impl Storage for LocalStorage {
    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
