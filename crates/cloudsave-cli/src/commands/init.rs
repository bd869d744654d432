use anyhow::Result;
use std::path::Path;

use cloudsave_core::config::CloudSaveConfig;
use cloudsave_core::config::secret::SecretKey;
use cloudsave_storage::registry::resolve_path;

pub fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing CloudSave in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = CloudSaveConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = CloudSaveConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    let config = CloudSaveConfig::load(&config_path)?;

    let settings_dir = resolve_path(base_dir, &config.cloudsave.settings_dir);
    std::fs::create_dir_all(&settings_dir)?;
    println!("Settings directory: {}", settings_dir.display());

    let key_path = resolve_path(base_dir, &config.cloudsave.secret_key_path);
    if key_path.exists() {
        println!("Key file already exists: {}", key_path.display());
    } else {
        SecretKey::load_or_create(&key_path)?;
        println!("Created key file: {}", key_path.display());
    }

    println!("\nCloudSave initialized. Next steps:");
    println!("  1. Add backends and directories to {}", config_path.display());
    println!("  2. Run `cloudsave store` to create your first revision");

    Ok(())
}
