//! Per-backend driver for initialize, store, restore and cleanup.
//!
//! Each orchestrator is single-flight: a call that arrives while another
//! operation is running, or before the backend is ready, is ignored and
//! returns [`Outcome::Skipped`]. Every transition is published on a watch
//! channel for whatever presentation layer is attached.

use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::backend::StorageBackend;
use crate::grouping::group_archives;
use crate::naming;
use crate::packer::ArchivePacker;
use crate::retention::RetentionPolicy;
use crate::state::OperationState::*;
use crate::state::{BackendStatus, OperationState, Outcome};
use crate::types::Timestamp;

pub struct BackupOrchestrator {
    backend: Arc<dyn StorageBackend>,
    packer: Arc<dyn ArchivePacker>,
    store_target: AtomicBool,
    restore_source: AtomicBool,
    status: watch::Sender<BackendStatus>,
}

impl BackupOrchestrator {
    /// New orchestrator; the backend is neither a store target nor a
    /// restore source until told otherwise.
    pub fn new(backend: Arc<dyn StorageBackend>, packer: Arc<dyn ArchivePacker>) -> Self {
        let (status, _) = watch::channel(BackendStatus::default());
        Self {
            backend,
            packer,
            store_target: AtomicBool::new(false),
            restore_source: AtomicBool::new(false),
            status,
        }
    }

    pub fn with_roles(self, store_target: bool, restore_source: bool) -> Self {
        self.set_store_target(store_target);
        self.set_restore_source(restore_source);
        self
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn is_store_target(&self) -> bool {
        self.store_target.load(Ordering::Acquire)
    }

    pub fn set_store_target(&self, value: bool) {
        self.store_target.store(value, Ordering::Release);
    }

    pub fn is_restore_source(&self) -> bool {
        self.restore_source.load(Ordering::Acquire)
    }

    pub fn set_restore_source(&self, value: bool) {
        self.restore_source.store(value, Ordering::Release);
    }

    pub fn state(&self) -> OperationState {
        self.status.borrow().state
    }

    pub fn status(&self) -> BackendStatus {
        self.status.borrow().clone()
    }

    /// Receiver for status transitions.
    pub fn subscribe(&self) -> watch::Receiver<BackendStatus> {
        self.status.subscribe()
    }

    /// Authenticate the backend. Runs from `Uninitialized` or, as a retry,
    /// from `Failed`; concurrent calls while initializing do nothing.
    pub async fn initialize(&self) -> Outcome {
        if !self.begin(&[Uninitialized, Failed], Initializing, "Initializing...") {
            return Outcome::Skipped;
        }
        let mut guard = BusyGuard::new(self, Initializing, Failed);

        match self.backend.initialize().await {
            Ok(()) => {
                tracing::info!(backend = self.name(), "Initialized");
                guard.exit = Ready;
                self.report("Initialized", None);
                Outcome::Completed
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(backend = self.name(), "Initialization failed: {message}");
                self.report("Initialization failed", Some(message.clone()));
                Outcome::Failed(message)
            }
        }
    }

    /// Upload one archive per directory, concurrently, then prune old
    /// revisions. Cleanup only runs when every upload succeeded.
    pub async fn store(
        &self,
        timestamp: Timestamp,
        directories: &[PathBuf],
        revisions_to_keep: usize,
    ) -> Outcome {
        if !self.is_store_target() || !self.begin(&[Ready], Storing, "Storing...") {
            return Outcome::Skipped;
        }
        let _guard = BusyGuard::new(self, Storing, Ready);

        match self.store_inner(timestamp, directories, revisions_to_keep).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e),
        }
    }

    /// Download and unpack the newest revision, one archive at a time.
    pub async fn restore(&self) -> Outcome {
        if !self.is_restore_source() || !self.begin(&[Ready], Restoring, "Restoring...") {
            return Outcome::Skipped;
        }
        let _guard = BusyGuard::new(self, Restoring, Ready);

        match self.restore_inner().await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e),
        }
    }

    /// Standalone retention pass. Only store targets are pruned.
    pub async fn cleanup(&self, revisions_to_keep: usize) -> Outcome {
        if !self.is_store_target() || !self.begin(&[Ready], CleaningUp, "Cleaning up...") {
            return Outcome::Skipped;
        }
        let _guard = BusyGuard::new(self, CleaningUp, Ready);

        match self.cleanup_inner(revisions_to_keep).await {
            Ok(true) => {
                self.report("Cleanup done", None);
                Outcome::Completed
            }
            Ok(false) => {
                self.report("Failed to cleanup", None);
                Outcome::Failed("failed to cleanup".to_string())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Release the backend. Ignored while an operation is in flight; the
    /// state only reaches `Uninitialized` once the backend is released.
    pub async fn dispose(&self) -> Outcome {
        if !self.begin(&[Uninitialized, Ready, Failed], Disposing, "Disposing...") {
            return Outcome::Skipped;
        }
        let _guard = BusyGuard::new(self, Disposing, Uninitialized);

        self.backend.dispose().await;
        self.report("Disposed", None);
        Outcome::Completed
    }

    async fn store_inner(
        &self,
        timestamp: Timestamp,
        directories: &[PathBuf],
        revisions_to_keep: usize,
    ) -> anyhow::Result<Outcome> {
        tracing::info!(
            backend = self.name(),
            %timestamp,
            directories = directories.len(),
            "Storing"
        );

        if let Some(name) = duplicate_directory_name(directories) {
            let detail = format!("more than one directory named '{name}'");
            tracing::warn!(backend = self.name(), "Store failed: {detail}");
            self.report("Store failed", Some(detail.clone()));
            return Ok(Outcome::Failed(detail));
        }

        let results = join_all(
            directories
                .iter()
                .map(|dir| self.store_directory(timestamp, dir)),
        )
        .await;

        let mut failures = Vec::new();
        for (dir, result) in directories.iter().zip(results) {
            match result {
                Ok(true) => {}
                Ok(false) => failures.push(format!("{}: upload incomplete", dir.display())),
                Err(e) => failures.push(format!("{}: {e:#}", dir.display())),
            }
        }

        if !failures.is_empty() {
            let detail = failures.join("; ");
            tracing::warn!(backend = self.name(), "Store failed: {detail}");
            self.report("Store failed", Some(detail.clone()));
            return Ok(Outcome::Failed(detail));
        }

        self.report("Cleaning up...", None);

        if self.cleanup_inner(revisions_to_keep).await? {
            self.report("Store done", None);
            Ok(Outcome::Completed)
        } else {
            self.report("Failed to cleanup", None);
            Ok(Outcome::Failed("failed to cleanup".to_string()))
        }
    }

    async fn store_directory(&self, timestamp: Timestamp, directory: &Path) -> anyhow::Result<bool> {
        let name = directory
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("invalid directory path"))?;
        let remote_filename = naming::encode(timestamp, name);

        let data = self.packer.pack(directory).await?;
        tracing::debug!(
            backend = self.name(),
            "Uploading {remote_filename} ({} bytes)",
            data.len()
        );
        self.backend.upload(&remote_filename, data).await
    }

    async fn restore_inner(&self) -> anyhow::Result<Outcome> {
        self.report("Retrieving save data list...", None);

        let groups = group_archives(self.backend.list_archives().await?);
        let Some(newest) = groups.into_iter().next() else {
            self.report("No save data", None);
            return Ok(Outcome::NothingToRestore);
        };

        tracing::info!(
            backend = self.name(),
            timestamp = %newest.timestamp,
            archives = newest.len(),
            "Restoring"
        );

        // Unpacking writes to one shared location, so archives go one by one.
        for archive in &newest.archives {
            self.report(format!("Restoring {}...", archive.directory_name), None);
            let data = self.backend.download(archive).await?;
            self.packer.unpack(&archive.directory_name, data).await?;
        }

        self.report("Restore done", None);
        Ok(Outcome::Completed)
    }

    async fn cleanup_inner(&self, revisions_to_keep: usize) -> anyhow::Result<bool> {
        let groups = group_archives(self.backend.list_archives().await?);
        let expired = RetentionPolicy::keep_last(revisions_to_keep).select_for_deletion(&groups);

        if expired.is_empty() {
            return Ok(true);
        }

        tracing::info!(
            backend = self.name(),
            revisions = groups.len(),
            keep = revisions_to_keep,
            archives = expired.len(),
            "Deleting expired archives"
        );
        Ok(self.backend.delete_many(&expired).await)
    }

    /// Atomically move from one of `from` to `to`.
    fn begin(&self, from: &[OperationState], to: OperationState, status: &str) -> bool {
        self.status.send_if_modified(|current| {
            if !from.contains(&current.state) {
                return false;
            }
            *current = BackendStatus::new(to, status);
            true
        })
    }

    fn report(&self, status: impl Into<String>, detail: Option<String>) {
        let status = status.into();
        self.status.send_modify(|current| {
            current.status = status;
            current.detail = detail;
        });
    }

    fn fail(&self, error: anyhow::Error) -> Outcome {
        let message = format!("{error:#}");
        tracing::warn!(backend = self.name(), "{message}");
        self.report(format!("Error: {message}"), Some(message.clone()));
        Outcome::Failed(message)
    }
}

/// Directories sharing a name would encode to the same archive name.
fn duplicate_directory_name(directories: &[PathBuf]) -> Option<String> {
    let mut seen = HashSet::new();
    directories
        .iter()
        .filter_map(|dir| dir.file_name())
        .find(|name| !seen.insert(*name))
        .map(|name| name.to_string_lossy().into_owned())
}

/// Moves the state out of `busy` when dropped, so an operation that returns
/// early, panics or is cancelled never leaves the backend stuck.
struct BusyGuard<'a> {
    orchestrator: &'a BackupOrchestrator,
    busy: OperationState,
    exit: OperationState,
}

impl<'a> BusyGuard<'a> {
    fn new(orchestrator: &'a BackupOrchestrator, busy: OperationState, exit: OperationState) -> Self {
        Self {
            orchestrator,
            busy,
            exit,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let (busy, exit) = (self.busy, self.exit);
        self.orchestrator.status.send_if_modified(|current| {
            if current.state != busy {
                return false;
            }
            current.state = exit;
            true
        });
    }
}
