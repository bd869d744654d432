use anyhow::Result;
use std::path::Path;

use cloudsave_core::state::Outcome;
use cloudsave_storage::registry::resolve_path;

use super::{load_config, start_fleet, summarize, with_init_failures};

pub async fn run(base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    let restore_root = resolve_path(base_dir, &config.cloudsave.restore_root);
    println!("Restoring into {}", restore_root.display());

    let started = start_fleet(&config, base_dir).await?;
    let reports = started.fleet.restore_first().await;
    let init = started.stop().await;
    let reports = with_init_failures(&init, reports);

    println!();
    summarize("Restore", &reports)?;

    if !reports.iter().any(|r| r.outcome == Outcome::Completed) {
        println!("\nNo save data found on any restore source.");
    }
    Ok(())
}
