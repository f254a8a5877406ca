//! Folder processing
//!
//! Walks a configuration tree and pushes every file to Midpoint:
//!
//! - `*.xml` - full object replaced with PUT
//! - `*.patch` - `objectModification` sent with PATCH; the oid is the file
//!   name up to the first `.` and the REST collection is the segment after
//!   the first `_` of the folder name (`03_roles/role-1.patch`)
//! - `*.json` - declarative operations, see [`crate::operation`]
//!
//! Each file is copied to its own scratch file, placeholders are
//! substituted there, and the scratch file is removed once the file was
//! handled. Processing stops at the first failing file.

use crate::error::MidpointError;
use crate::midpoint::MidpointClient;
use crate::operation::{self, Operation};
use crate::properties::Properties;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Kind of file found in a configuration folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Object,
    Patch,
    Operations,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xml") => Some(Self::Object),
            Some("patch") => Some(Self::Patch),
            Some("json") => Some(Self::Operations),
            _ => None,
        }
    }
}

/// Oid targeted by a `.patch` file: its name up to the first `.`
pub fn patch_oid(path: &Path) -> Result<String, MidpointError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|oid| !oid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MidpointError::InvalidFileLayout(format!("no oid in {}", path.display())))
}

/// REST collection for a `.patch` file: the folder name segment after the first `_`
pub fn patch_endpoint(path: &Path) -> Result<String, MidpointError> {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').nth(1))
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            MidpointError::InvalidFileLayout(format!(
                "folder of {} does not name an endpoint as <order>_<endpoint>",
                path.display()
            ))
        })
}

/// Entries of `dir` accepted by `keep`, sorted by file name
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    entries.retain(|p| keep(p.as_path()));
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Pushes configuration trees to Midpoint, one file at a time
pub struct Processor<'a> {
    client: &'a MidpointClient,
    properties: &'a Properties,
    scratch_dir: Option<PathBuf>,
}

impl<'a> Processor<'a> {
    pub fn new(client: &'a MidpointClient, properties: &'a Properties) -> Self {
        Self {
            client,
            properties,
            scratch_dir: None,
        }
    }

    /// Create scratch files in `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Process every subfolder of `root`, in name order
    pub async fn process_subfolders(&self, root: &Path) -> Result<()> {
        if !root.exists() {
            tracing::error!("Folder not found: {}", root.display());
            return Ok(());
        }
        tracing::debug!("Processing dir: {}", root.display());
        for folder in sorted_entries(root, Path::is_dir)? {
            self.process_folder(&folder).await?;
        }
        Ok(())
    }

    /// Process the files of one folder, in name order
    pub async fn process_folder(&self, folder: &Path) -> Result<()> {
        tracing::debug!("Processing dir: {}", folder.display());
        if !folder.exists() {
            tracing::error!("Folder not found: {}", folder.display());
            return Ok(());
        }
        for file in sorted_entries(folder, Path::is_file)? {
            self.process_file(&file).await?;
        }
        Ok(())
    }

    /// Process one file according to its extension
    pub async fn process_file(&self, path: &Path) -> Result<()> {
        let Some(kind) = FileKind::from_path(path) else {
            tracing::trace!("Skipping {}", path.display());
            return Ok(());
        };
        tracing::info!("Processing file: {}", path.display());

        let scratch = self.scratch_copy(path)?;
        let content = std::fs::read_to_string(scratch.path())
            .with_context(|| format!("Failed to read scratch copy of {}", path.display()))?;

        match kind {
            FileKind::Object => {
                self.client
                    .put_object(&content)
                    .await
                    .with_context(|| format!("Failed to PUT {}", path.display()))?;
            }
            FileKind::Patch => {
                let oid = patch_oid(path)?;
                let endpoint = patch_endpoint(path)?;
                tracing::debug!("Patching {}/{}", endpoint, oid);
                self.client
                    .patch_object(&content, &endpoint, &oid)
                    .await
                    .with_context(|| format!("Failed to PATCH {}", path.display()))?;
            }
            FileKind::Operations => {
                let operations = Operation::parse_all(&content)
                    .with_context(|| format!("Invalid operation file {}", path.display()))?;
                tracing::trace!(
                    "Processing {} operation(s) from {}",
                    operations.len(),
                    path.display()
                );
                for op in &operations {
                    operation::execute(self.client, op)
                        .await
                        .with_context(|| {
                            format!("Operation {} from {} failed", op.name(), path.display())
                        })?;
                }
            }
        }
        Ok(())
    }

    /// Copy `path` to a fresh scratch file and substitute its placeholders
    fn scratch_copy(&self, path: &Path) -> Result<NamedTempFile> {
        let scratch = match &self.scratch_dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .context("Failed to create scratch file")?;

        std::fs::copy(path, scratch.path())
            .with_context(|| format!("Failed to copy {} to scratch file", path.display()))?;
        self.properties.replace_file(scratch.path())?;
        Ok(scratch)
    }
}
