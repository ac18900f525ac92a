//! Transient file storage and ZIP assembly
//!
//! Fetched bytes land under a task-scoped directory in the transient root;
//! `build` packs them into one ZIP per task under the archives root. The ZIP
//! path is derived purely from the task id, so the download side can locate
//! an artifact without consulting in-memory task state.

use crate::error::{BundleError, Error, Result};
use crate::types::TaskId;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds per-task ZIP archives from transient downloads
#[derive(Clone)]
pub struct ZipBuilder {
    temp_dir: PathBuf,
    archives_dir: PathBuf,
}

impl ZipBuilder {
    /// Create a builder over the given transient and archive roots
    pub fn new(temp_dir: impl Into<PathBuf>, archives_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            archives_dir: archives_dir.into(),
        }
    }

    /// Transient directory for one task
    pub fn task_dir(&self, task_id: &TaskId) -> PathBuf {
        self.temp_dir.join(task_id.as_str())
    }

    /// Deterministic archive path for one task
    pub fn archive_path(&self, task_id: &TaskId) -> PathBuf {
        self.archives_dir.join(format!("{task_id}.zip"))
    }

    /// Persist one retrieved file under the task's transient directory,
    /// creating the directory on demand
    pub async fn save_file(&self, task_id: &TaskId, file_name: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.task_dir(task_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Bundle(BundleError::CreateDir {
                path: dir.clone(),
                reason: e.to_string(),
            })
        })?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            Error::Bundle(BundleError::WriteFile {
                path: path.clone(),
                reason: e.to_string(),
            })
        })?;

        debug!(task_id = %task_id, file = file_name, size = bytes.len(), "transient file saved");
        Ok(())
    }

    /// Assemble the task's ZIP from its transient files
    ///
    /// Entries are written in exactly the order given — insertion order, not
    /// alphabetical. The first I/O error aborts the build; a partial ZIP may
    /// be left behind at the output path.
    ///
    /// The `zip` crate is synchronous, so assembly runs on the blocking
    /// thread pool.
    pub async fn build(&self, task_id: &TaskId, files: &[String]) -> Result<PathBuf> {
        let task_dir = self.task_dir(task_id);
        let zip_path = self.archive_path(task_id);
        let archives_dir = self.archives_dir.clone();
        let files = files.to_vec();

        let out_path = zip_path.clone();
        tokio::task::spawn_blocking(move || {
            write_zip(&archives_dir, &task_dir, &zip_path, &files)
        })
        .await
        .map_err(|e| {
            Error::Bundle(BundleError::Archive {
                path: out_path.clone(),
                reason: format!("blocking worker failed: {e}"),
            })
        })??;

        debug!(task_id = %task_id, path = %out_path.display(), "archive built");
        Ok(out_path)
    }

    /// Remove the task's transient directory
    ///
    /// A missing directory is a successful no-op.
    pub async fn cleanup(&self, task_id: &TaskId) -> Result<()> {
        let dir = self.task_dir(task_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Bundle(BundleError::Remove {
                path: dir,
                reason: e.to_string(),
            })),
        }
    }
}

fn write_zip(
    archives_dir: &Path,
    task_dir: &Path,
    zip_path: &Path,
    files: &[String],
) -> Result<()> {
    std::fs::create_dir_all(archives_dir).map_err(|e| {
        Error::Bundle(BundleError::CreateDir {
            path: archives_dir.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    let zip_file = std::fs::File::create(zip_path).map_err(|e| {
        Error::Bundle(BundleError::WriteFile {
            path: zip_path.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    let mut writer = zip::ZipWriter::new(zip_file);
    let options = zip::write::FileOptions::default();

    for file_name in files {
        let file_path = task_dir.join(file_name);
        let mut input = std::fs::File::open(&file_path).map_err(|e| {
            Error::Bundle(BundleError::OpenFile {
                path: file_path.clone(),
                reason: e.to_string(),
            })
        })?;

        writer.start_file(file_name.as_str(), options).map_err(|e| {
            Error::Bundle(BundleError::Archive {
                path: zip_path.to_path_buf(),
                reason: format!("failed to start entry {file_name}: {e}"),
            })
        })?;

        std::io::copy(&mut input, &mut writer).map_err(|e| {
            Error::Bundle(BundleError::Archive {
                path: zip_path.to_path_buf(),
                reason: format!("failed to copy {file_name}: {e}"),
            })
        })?;
    }

    writer.finish().map_err(|e| {
        Error::Bundle(BundleError::Archive {
            path: zip_path.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    Ok(())
}
