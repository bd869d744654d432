use anyhow::Result;
use std::path::Path;

use cloudsave_core::grouping::group_archives;
use cloudsave_core::state::OperationState;

use super::{load_config, start_fleet};

pub async fn run(base_dir: &Path) -> Result<()> {
    let config = load_config(base_dir)?;
    let keep = config.cloudsave.revisions_to_keep;

    let started = start_fleet(&config, base_dir).await?;
    let mut listings = Vec::new();
    for orchestrator in started.fleet.orchestrators() {
        let listing = if orchestrator.state() == OperationState::Ready {
            orchestrator.backend().list_archives().await.map(group_archives)
        } else {
            Err(anyhow::anyhow!("{}", orchestrator.status().status))
        };
        listings.push((orchestrator.name().to_string(), listing));
    }
    started.stop().await;

    let mut failed = 0usize;
    for (name, listing) in listings {
        println!("\n{name}");
        let groups = match listing {
            Ok(groups) => groups,
            Err(e) => {
                println!("  error: {e:#}");
                failed += 1;
                continue;
            }
        };
        if groups.is_empty() {
            println!("  No revisions found.");
            continue;
        }

        println!("  {:<16} {:<8} {}", "REVISION", "KEPT", "DIRECTORIES");
        for (i, group) in groups.iter().enumerate() {
            println!(
                "  {:<16} {:<8} {}",
                group.timestamp.to_string(),
                if i < keep { "yes" } else { "no" },
                group.directory_names().collect::<Vec<_>>().join(", "),
            );
        }
    }

    if failed > 0 {
        anyhow::bail!("Listing failed on {failed} backends");
    }
    Ok(())
}
