use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CloudSaveError, Result};

/// Turns local directories into archive bytes and back.
#[async_trait]
pub trait ArchivePacker: Send + Sync {
    /// Pack a directory, rooted at the directory's own name.
    async fn pack(&self, directory: &Path) -> anyhow::Result<Vec<u8>>;

    /// Unpack an archive of `directory_name` onto the local filesystem.
    async fn unpack(&self, directory_name: &str, data: Vec<u8>) -> anyhow::Result<()>;
}

/// Zip packer. Archives unpack into `restore_root`, recreating
/// `<restore_root>/<directory_name>/...`; existing files are overwritten.
pub struct ZipPacker {
    restore_root: PathBuf,
}

impl ZipPacker {
    pub fn new(restore_root: impl Into<PathBuf>) -> Self {
        Self {
            restore_root: restore_root.into(),
        }
    }

    pub fn restore_root(&self) -> &Path {
        &self.restore_root
    }
}

#[async_trait]
impl ArchivePacker for ZipPacker {
    async fn pack(&self, directory: &Path) -> anyhow::Result<Vec<u8>> {
        let directory = directory.to_path_buf();
        let data = tokio::task::spawn_blocking(move || zip_directory(&directory)).await??;
        Ok(data)
    }

    async fn unpack(&self, directory_name: &str, data: Vec<u8>) -> anyhow::Result<()> {
        let root = self.restore_root.clone();
        tokio::task::spawn_blocking(move || unzip_into(&root, data)).await??;
        tracing::debug!("Unpacked {directory_name} into {}", self.restore_root.display());
        Ok(())
    }
}

/// Zip `dir` into memory. Entry paths start with the directory's name.
pub fn zip_directory(dir: &Path) -> Result<Vec<u8>> {
    if !dir.is_dir() {
        return Err(CloudSaveError::Archive(format!(
            "not a directory: {}",
            dir.display()
        )));
    }
    let root_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CloudSaveError::Archive(format!("invalid directory name: {}", dir.display())))?;

    let mut entries = Vec::new();
    walk_recursive(dir, &mut entries)?;
    entries.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.add_directory(format!("{root_name}/"), options)?;
    for path in &entries {
        let relative = path
            .strip_prefix(dir)
            .map_err(|e| CloudSaveError::Archive(e.to_string()))?;
        let entry_name = format!("{root_name}/{}", zip_path(relative));

        if path.is_dir() {
            writer.add_directory(format!("{entry_name}/"), options)?;
        } else {
            writer.start_file(entry_name, options)?;
            writer.write_all(&std::fs::read(path)?)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// Extract an in-memory zip under `root`. Entries escaping `root` are
/// rejected by the zip reader.
pub fn unzip_into(root: &Path, data: Vec<u8>) -> Result<()> {
    std::fs::create_dir_all(root)?;
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    archive.extract(root)?;
    Ok(())
}

fn zip_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Symlinks are not followed, so a link loop cannot recurse forever.
fn walk_recursive(dir: &Path, entries: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            entries.push(path.clone());
            walk_recursive(&path, entries)?;
        } else if file_type.is_file() {
            entries.push(path);
        }
    }
    Ok(())
}
