use async_trait::async_trait;
use std::path::{Path, PathBuf};

use cloudsave_core::backend::StorageBackend;
use cloudsave_core::types::{ArchiveDescriptor, RemoteEntry};

/// Folder-backed backend for NAS/USB targets and local testing.
pub struct LocalBackend {
    base_path: PathBuf,
    name: String,
}

impl LocalBackend {
    pub fn new(base_path: &Path, name: &str) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Archive ids are bare filenames; anything else would escape the folder.
    fn archive_path(&self, id: &str) -> anyhow::Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            anyhow::bail!("invalid archive id: {id}");
        }
        Ok(self.base_path.join(id))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        if !tokio::fs::metadata(&self.base_path).await?.is_dir() {
            anyhow::bail!("Base path is not a directory: {}", self.base_path.display());
        }
        Ok(())
    }

    async fn list_entries(&self) -> anyhow::Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                entries.push(RemoteEntry::new(name, name));
            }
        }
        Ok(entries)
    }

    async fn download(&self, archive: &ArchiveDescriptor) -> anyhow::Result<Vec<u8>> {
        let path = self.archive_path(&archive.remote_id)?;
        Ok(tokio::fs::read(&path).await?)
    }

    async fn upload(&self, remote_filename: &str, data: Vec<u8>) -> anyhow::Result<bool> {
        let path = self.archive_path(remote_filename.trim_start_matches('/'))?;
        // Write then rename, so a listing never sees a half-written archive.
        let partial = path.with_extension("zip.partial");
        tokio::fs::write(&partial, &data).await?;
        tokio::fs::rename(&partial, &path).await?;
        Ok(true)
    }

    async fn delete(&self, archive: &ArchiveDescriptor) -> anyhow::Result<()> {
        let path = self.archive_path(&archive.remote_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsave_core::naming;
    use tempfile::TempDir;

    async fn backend(tmp: &TempDir) -> LocalBackend {
        let backend = LocalBackend::new(&tmp.path().join("remote"), "test-local");
        backend.initialize().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn upload_list_download_delete() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;

        let name = naming::encode("20240101120000".parse().unwrap(), "Save_1");
        assert!(backend.upload(&name, b"zip bytes".to_vec()).await.unwrap());

        let archives = backend.list_archives().await.unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].directory_name, "Save_1");
        assert_eq!(archives[0].remote_id, name);

        assert_eq!(backend.download(&archives[0]).await.unwrap(), b"zip bytes");

        backend.delete(&archives[0]).await.unwrap();
        assert!(backend.list_archives().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_overwrites_same_name() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;

        backend.upload("/20240101120000_A.zip", b"v1".to_vec()).await.unwrap();
        backend.upload("20240101120000_A.zip", b"v2".to_vec()).await.unwrap();

        let archives = backend.list_archives().await.unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(backend.download(&archives[0]).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn listing_skips_foreign_files_and_dirs() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;

        backend.upload("20240101120000_A.zip", b"a".to_vec()).await.unwrap();
        std::fs::write(backend.base_path().join("notarchive.txt"), b"x").unwrap();
        std::fs::create_dir(backend.base_path().join("20240101120000_Dir.zip")).unwrap();

        let archives = backend.list_archives().await.unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].directory_name, "A");
        assert_eq!(backend.list_entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_many_reports_all_succeeded() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;

        backend.upload("20240101120000_A.zip", b"a".to_vec()).await.unwrap();
        backend.upload("20240101120000_B.zip", b"b".to_vec()).await.unwrap();

        let archives = backend.list_archives().await.unwrap();
        assert!(backend.delete_many(&archives).await);
        assert!(backend.list_archives().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_ids_escaping_the_folder() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        assert!(backend.upload("../20240101120000_A.zip", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn initialize_fails_on_file_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(LocalBackend::new(&file, "bad").initialize().await.is_err());
    }
}
