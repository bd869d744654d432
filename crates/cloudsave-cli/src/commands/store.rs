use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{load_config, start_fleet, summarize, with_init_failures};

pub async fn run(directories: &[PathBuf], base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;

    let directories = if directories.is_empty() {
        config.directories()
    } else {
        directories.to_vec()
    };
    if directories.is_empty() {
        anyhow::bail!("Nothing to store: pass directories or set `directories` in the config");
    }
    let mut names = HashSet::new();
    for dir in &directories {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {}", dir.display());
        }
        let Some(name) = dir.file_name() else {
            anyhow::bail!("Directory has no name: {}", dir.display());
        };
        if !names.insert(name) {
            anyhow::bail!(
                "More than one directory named '{}'; archives are named after the directory",
                name.to_string_lossy()
            );
        }
    }

    println!("Storing {} directories", directories.len());

    let started = start_fleet(&config, base_dir).await?;
    let (timestamp, reports) = started
        .fleet
        .store_all(&directories, config.cloudsave.revisions_to_keep)
        .await;
    let init = started.stop().await;

    println!("\nRevision {timestamp}:");
    summarize("Store", &with_init_failures(&init, reports))
}
