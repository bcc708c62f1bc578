//! Filesystem helpers shared by the reconciler, auth and archive code.

#[cfg(unix)]
use std::os::unix::fs as unix_fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs as async_fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;

const REMOVE_ATTEMPTS: u32 = 3;

pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// True for anything at `path` that is not a directory, including dangling symlinks.
pub fn file_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| !m.is_dir())
        .unwrap_or(false)
}

/// Remove a file, symlink or directory tree. A missing path is not an error.
///
/// Transient failures (another process briefly holding a file) are retried.
pub async fn remove_path(path: &Path) -> ReposyncResult<()> {
    let mut attempt = 1;
    loop {
        match remove_once(path).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < REMOVE_ATTEMPTS => {
                debug!(path = %path.display(), error = %e, attempt, "remove failed, retrying");
                tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(ReposyncError::filesystem_error_with_source(
                    "Failed to remove path",
                    Some(path.to_path_buf()),
                    e,
                ))
            }
        }
    }
}

async fn remove_once(path: &Path) -> io::Result<()> {
    let metadata = async_fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        async_fs::remove_dir_all(path).await
    } else {
        async_fs::remove_file(path).await
    }
}

/// Delete everything inside `dir` but keep `dir` itself.
pub async fn remove_directory_contents(dir: &Path) -> ReposyncResult<()> {
    let mut entries = async_fs::read_dir(dir).await.map_err(|e| {
        ReposyncError::filesystem_error_with_source(
            "Failed to read directory",
            Some(dir.to_path_buf()),
            e,
        )
    })?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        ReposyncError::filesystem_error_with_source(
            "Failed to read directory entry",
            Some(dir.to_path_buf()),
            e,
        )
    })? {
        remove_path(&entry.path()).await?;
    }
    Ok(())
}

/// Move every entry of `from` into `to`.
///
/// Falls back to copy + remove when a rename is not possible (different devices).
pub async fn move_entries(from: &Path, to: &Path) -> ReposyncResult<()> {
    let mut entries = async_fs::read_dir(from).await.map_err(|e| {
        ReposyncError::filesystem_error_with_source(
            "Failed to read directory",
            Some(from.to_path_buf()),
            e,
        )
    })?;

    while let Some(entry) = entries.next_entry().await? {
        let source = entry.path();
        let target = to.join(entry.file_name());

        if async_fs::rename(&source, &target).await.is_ok() {
            continue;
        }

        debug!(source = %source.display(), "rename failed, copying instead");
        let (src, dst) = (source.clone(), target.clone());
        tokio::task::spawn_blocking(move || copy_recursive(&src, &dst))
            .await
            .map_err(|e| ReposyncError::internal_error_with_source("Copy task failed", e))?
            .map_err(|e| {
                ReposyncError::filesystem_error_with_source(
                    "Failed to copy",
                    Some(source.clone()),
                    e,
                )
            })?;
        remove_path(&source).await?;
    }
    Ok(())
}

/// Copy a file or tree, recreating symlinks instead of following them.
pub fn copy_recursive(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let destination: PathBuf = if relative.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())?;
            #[cfg(unix)]
            unix_fs::symlink(&link, &destination)?;
            #[cfg(not(unix))]
            std::fs::copy(entry.path().parent().unwrap_or(source).join(link), &destination)
                .map(|_| ())?;
        } else {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
