use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tokio::fs;

pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Writes through a sibling temp file and renames it over `path`, so readers
/// never observe a half-written document.
pub async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path).await?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("invalid target path {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path: PathBuf = path.with_file_name(tmp_name);
    fs::write(&tmp_path, content).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Removes `path`; `false` when it did not exist.
pub async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
