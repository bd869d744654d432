use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;

use crate::orchestrator::BackupOrchestrator;
use crate::state::Outcome;
use crate::types::Timestamp;

/// Outcome of one operation on one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReport {
    pub backend: String,
    pub outcome: Outcome,
}

/// All configured backends, each driven by its own orchestrator.
pub struct Fleet {
    orchestrators: Vec<Arc<BackupOrchestrator>>,
}

impl Fleet {
    pub fn new(orchestrators: Vec<Arc<BackupOrchestrator>>) -> Self {
        Self { orchestrators }
    }

    pub fn orchestrators(&self) -> &[Arc<BackupOrchestrator>] {
        &self.orchestrators
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BackupOrchestrator>> {
        self.orchestrators.iter().find(|o| o.name() == name)
    }

    pub async fn initialize_all(&self) -> Vec<BackendReport> {
        join_all(self.orchestrators.iter().map(|o| async move {
            report(o, o.initialize().await)
        }))
        .await
    }

    /// Store to every store target concurrently under one shared timestamp,
    /// so the archives form a single revision on each backend.
    pub async fn store_all(
        &self,
        directories: &[PathBuf],
        revisions_to_keep: usize,
    ) -> (Timestamp, Vec<BackendReport>) {
        let timestamp = Timestamp::now();
        let reports = join_all(self.orchestrators.iter().map(|o| async move {
            report(o, o.store(timestamp, directories, revisions_to_keep).await)
        }))
        .await;
        (timestamp, reports)
    }

    /// Restore from the first restore source that has data.
    ///
    /// Sources are tried in order, never concurrently: restores from
    /// different backends unpack into the same local location.
    pub async fn restore_first(&self) -> Vec<BackendReport> {
        let mut reports = Vec::new();
        for o in &self.orchestrators {
            let outcome = o.restore().await;
            let done = outcome == Outcome::Completed;
            reports.push(report(o, outcome));
            if done {
                break;
            }
        }
        reports
    }

    pub async fn cleanup_all(&self, revisions_to_keep: usize) -> Vec<BackendReport> {
        join_all(self.orchestrators.iter().map(|o| async move {
            report(o, o.cleanup(revisions_to_keep).await)
        }))
        .await
    }

    pub async fn dispose_all(&self) {
        join_all(self.orchestrators.iter().map(|o| o.dispose())).await;
    }
}

fn report(orchestrator: &BackupOrchestrator, outcome: Outcome) -> BackendReport {
    BackendReport {
        backend: orchestrator.name().to_string(),
        outcome,
    }
}
