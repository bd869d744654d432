use async_trait::async_trait;
use futures::future::join_all;

use crate::types::{ArchiveDescriptor, RemoteEntry};

/// Trait for remote archive stores.
///
/// Each implementation owns its own credentials and connection; instances
/// share no state with one another.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend name for display and logging.
    fn name(&self) -> &str;

    /// Authenticate and open the connection.
    async fn initialize(&self) -> anyhow::Result<()>;

    /// Raw listing of the backend's archive area.
    async fn list_entries(&self) -> anyhow::Result<Vec<RemoteEntry>>;

    /// Listing decoded into archives. Entries whose names do not decode are
    /// skipped.
    async fn list_archives(&self) -> anyhow::Result<Vec<ArchiveDescriptor>> {
        let entries = self.list_entries().await?;
        Ok(decode_entries(self.name(), entries))
    }

    /// Download an archive's bytes.
    async fn download(&self, archive: &ArchiveDescriptor) -> anyhow::Result<Vec<u8>>;

    /// Upload an archive, overwriting any archive of the same name.
    /// `Ok(false)` means the backend accepted the call but did not complete it.
    async fn upload(&self, remote_filename: &str, data: Vec<u8>) -> anyhow::Result<bool>;

    /// Delete one archive.
    async fn delete(&self, archive: &ArchiveDescriptor) -> anyhow::Result<()>;

    /// Delete a batch concurrently. Returns true iff every deletion succeeded;
    /// deletions that succeeded are kept either way.
    async fn delete_many(&self, archives: &[ArchiveDescriptor]) -> bool {
        let results = join_all(archives.iter().map(|archive| self.delete(archive))).await;

        let mut all_deleted = true;
        for (archive, result) in archives.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    backend = self.name(),
                    "Failed to delete {}: {e:#}",
                    archive.remote_id
                );
                all_deleted = false;
            }
        }
        all_deleted
    }

    /// Release the client and any connection.
    async fn dispose(&self) {}
}

/// Decode listing entries, dropping the ones that are not archive names.
pub fn decode_entries(backend: &str, entries: Vec<RemoteEntry>) -> Vec<ArchiveDescriptor> {
    entries
        .into_iter()
        .filter_map(|entry| match ArchiveDescriptor::from_entry(entry) {
            Ok(archive) => Some(archive),
            Err(e) => {
                tracing::debug!(backend, "Skipping listing entry: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_entries_skips_foreign_names() {
        let entries = vec![
            RemoteEntry::new("a", "20240101120000_Save1.zip"),
            RemoteEntry::new("b", "notarchive.txt"),
            RemoteEntry::new("c", "/20240102093000_Save2.zip"),
            RemoteEntry::new("d", "garbage_Save3.zip"),
        ];

        let archives = decode_entries("test", entries);
        let ids: Vec<_> = archives.iter().map(|a| a.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(archives[1].directory_name, "Save2");
    }
}
