use anyhow::Result;
use std::path::Path;

use cloudsave_core::config::CloudSaveConfig;
use cloudsave_core::config::secret;

pub fn run(base_dir: &Path) -> Result<()> {
    let config_path = CloudSaveConfig::default_path(base_dir);
    let config = CloudSaveConfig::load(&config_path)?;

    println!("Config: {}", config_path.display());
    println!();
    println!("  Revisions kept: {}", config.cloudsave.revisions_to_keep);
    println!("  Restore root:   {}", config.cloudsave.restore_root);
    println!("  Settings dir:   {}", config.cloudsave.settings_dir);
    println!("  Key file:       {}", config.cloudsave.secret_key_path);
    println!();

    if config.cloudsave.directories.is_empty() {
        println!("  No directories configured.");
    } else {
        println!("  Directories ({}):", config.cloudsave.directories.len());
        for dir in &config.cloudsave.directories {
            println!("    - {dir}");
        }
    }
    println!();

    if config.backends.is_empty() {
        println!("  No backends configured.");
        println!();
        println!("  Add backends to {}:", config_path.display());
        println!("  [[backends]]");
        println!("  name = \"nas\"");
        println!("  type = \"local\"    # or \"s3\", \"s3compatible\", \"gcs\"");
        println!("  bucket = \"/path/to/storage\"");
    } else {
        println!("  Backends ({}):", config.backends.len());
        for b in &config.backends {
            let roles = match (b.store_target, b.restore_source) {
                (true, true) => "store+restore",
                (true, false) => "store",
                (false, true) => "restore",
                (false, false) => "disabled",
            };
            let credentials = match &b.secret_key {
                Some(value) if secret::is_protected(value) => ", credentials=protected",
                Some(_) => ", credentials=plaintext",
                None => "",
            };
            println!(
                "    - {} (type={}, bucket={}, roles={roles}{credentials})",
                b.name, b.kind, b.bucket
            );
        }
    }

    if let Err(e) = config.validate() {
        println!();
        println!("  WARNING: {e}");
    }

    Ok(())
}
