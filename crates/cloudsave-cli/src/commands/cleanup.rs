use anyhow::Result;
use std::path::Path;

use super::{load_config, start_fleet, summarize, with_init_failures};

pub async fn run(keep: Option<usize>, base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    let keep = keep.unwrap_or(config.cloudsave.revisions_to_keep);
    if keep == 0 {
        anyhow::bail!("--keep must be at least 1");
    }

    println!("Keeping the newest {keep} revisions on every store target");

    let started = start_fleet(&config, base_dir).await?;
    let reports = started.fleet.cleanup_all(keep).await;
    let init = started.stop().await;

    println!();
    summarize("Cleanup", &with_init_failures(&init, reports))
}
