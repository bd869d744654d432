pub mod cleanup;
pub mod config;
pub mod init;
pub mod list;
pub mod progress;
pub mod restore;
pub mod store;

use anyhow::Result;
use std::path::Path;

use cloudsave_core::config::CloudSaveConfig;
use cloudsave_core::fleet::{BackendReport, Fleet};
use cloudsave_core::state::Outcome;
use cloudsave_storage::registry;

use progress::FleetProgress;

pub fn load_config(base_dir: &Path) -> Result<CloudSaveConfig> {
    let config_path = CloudSaveConfig::default_path(base_dir);
    let config = CloudSaveConfig::load(&config_path)?;
    config.validate()?;
    if config.backends.is_empty() {
        anyhow::bail!(
            "No backends configured. Add [[backends]] to {}",
            config_path.display()
        );
    }
    Ok(config)
}

/// A built fleet with its spinners and initialization results.
pub struct Started {
    pub fleet: Fleet,
    pub progress: FleetProgress,
    init: Vec<BackendReport>,
}

impl Started {
    /// Dispose every backend and settle the spinners.
    pub async fn stop(self) -> Vec<BackendReport> {
        self.fleet.dispose_all().await;
        self.progress.finish().await;
        self.init
    }
}

/// Build and initialize every configured backend.
///
/// Backends that fail to initialize stay in the fleet; their later
/// operations are skipped.
pub async fn start_fleet(config: &CloudSaveConfig, base_dir: &Path) -> Result<Started> {
    let fleet = registry::build_fleet(config, base_dir)?;
    tracing::debug!("Starting {} backends", fleet.orchestrators().len());
    let progress = FleetProgress::attach(&fleet);
    let init = fleet.initialize_all().await;
    Ok(Started {
        fleet,
        progress,
        init,
    })
}

/// A backend skipped because it never initialized reports the
/// initialization failure instead.
pub fn with_init_failures(init: &[BackendReport], reports: Vec<BackendReport>) -> Vec<BackendReport> {
    reports
        .into_iter()
        .map(|report| {
            let failed_init = init
                .iter()
                .find(|i| i.backend == report.backend && i.outcome.is_failure());
            match (failed_init, &report.outcome) {
                (Some(init), Outcome::Skipped) => init.clone(),
                _ => report,
            }
        })
        .collect()
}

/// Print one line per backend; fail if any backend failed.
pub fn summarize(action: &str, reports: &[BackendReport]) -> Result<()> {
    let mut failed = 0usize;
    for report in reports {
        println!("  {:<16} {}", report.backend, report.outcome);
        if report.outcome.is_failure() {
            failed += 1;
        }
    }
    if failed > 0 {
        anyhow::bail!("{action} failed on {failed} of {} backends", reports.len());
    }
    if reports.iter().all(|r| r.outcome == Outcome::Skipped) {
        anyhow::bail!("{action}: no backend was ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(backend: &str, outcome: Outcome) -> BackendReport {
        BackendReport {
            backend: backend.to_string(),
            outcome,
        }
    }

    #[test]
    fn skipped_after_failed_init_counts_as_failure() {
        let init = vec![
            report("nas", Outcome::Completed),
            report("s3", Outcome::Failed("access denied".into())),
        ];
        let reports = with_init_failures(
            &init,
            vec![report("nas", Outcome::Completed), report("s3", Outcome::Skipped)],
        );
        assert_eq!(reports[1].outcome, Outcome::Failed("access denied".into()));
        assert!(summarize("Store", &reports).is_err());
    }

    #[test]
    fn role_skips_are_not_failures() {
        let init = vec![report("nas", Outcome::Completed), report("usb", Outcome::Completed)];
        let reports = with_init_failures(
            &init,
            vec![report("nas", Outcome::Completed), report("usb", Outcome::Skipped)],
        );
        assert!(summarize("Store", &reports).is_ok());
    }

    #[test]
    fn nothing_ready_is_an_error() {
        let reports = vec![report("nas", Outcome::Skipped)];
        assert!(summarize("Cleanup", &reports).is_err());
    }
}
