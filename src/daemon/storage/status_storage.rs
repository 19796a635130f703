use std::path::{Path, PathBuf};

use anyhow::Result;

use super::entities::StatusEntity;

pub const STATUS_FILE: &str = "status.json";

/// Latest status of the daemon. Only the daemon writes it, so no locking is involved. The file is
/// replaced through a rename to never expose a partially written document.
#[derive(Debug, Clone)]
pub struct StatusStorage {
    path: PathBuf,
}

impl StatusStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STATUS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, status: &StatusEntity) -> Result<()> {
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, serde_json::to_vec_pretty(status)?).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    /// `None` when the daemon never wrote a status.
    pub async fn load(&self) -> Result<Option<StatusEntity>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
