use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use cloudsave_core::fleet::Fleet;
use cloudsave_core::orchestrator::BackupOrchestrator;
use cloudsave_core::state::{BackendStatus, OperationState};

/// One spinner per backend, fed by the orchestrator's status channel.
pub struct FleetProgress {
    _multi: MultiProgress,
    bars: Vec<Spinner>,
}

struct Spinner {
    orchestrator: Arc<BackupOrchestrator>,
    bar: ProgressBar,
    watcher: JoinHandle<()>,
}

impl FleetProgress {
    pub fn attach(fleet: &Fleet) -> Self {
        let multi = MultiProgress::new();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:<16.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bars = fleet
            .orchestrators()
            .iter()
            .map(|orchestrator| {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style.clone());
                bar.set_prefix(orchestrator.name().to_string());
                bar.enable_steady_tick(Duration::from_millis(120));

                let mut rx = orchestrator.subscribe();
                let watched = bar.clone();
                let watcher = tokio::spawn(async move {
                    loop {
                        let status = rx.borrow_and_update().clone();
                        watched.set_message(render(&status));
                        if rx.changed().await.is_err() {
                            break;
                        }
                    }
                });

                Spinner {
                    orchestrator: orchestrator.clone(),
                    bar,
                    watcher,
                }
            })
            .collect();

        Self {
            _multi: multi,
            bars,
        }
    }

    /// Stop the watchers and leave each spinner on its final status.
    pub async fn finish(self) {
        for spinner in self.bars {
            spinner.watcher.abort();
            let _ = spinner.watcher.await;
            spinner
                .bar
                .finish_with_message(render(&spinner.orchestrator.status()));
        }
    }
}

pub fn render(status: &BackendStatus) -> String {
    let text = match &status.detail {
        Some(detail) if !status.status.contains(detail.as_str()) => {
            format!("{} ({detail})", status.status)
        }
        _ => status.status.clone(),
    };
    match status.state {
        OperationState::Failed => format!("[failed] {text}"),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_appends_detail_once() {
        let mut status = BackendStatus::new(OperationState::Ready, "Store failed");
        status.detail = Some("Save1: disk full".into());
        assert_eq!(render(&status), "Store failed (Save1: disk full)");

        let mut status = BackendStatus::new(OperationState::Ready, "Error: timeout");
        status.detail = Some("timeout".into());
        assert_eq!(render(&status), "Error: timeout");
    }

    #[test]
    fn render_marks_failed_backends() {
        let status = BackendStatus::new(OperationState::Failed, "Initialization failed");
        assert_eq!(render(&status), "[failed] Initialization failed");
    }
}
