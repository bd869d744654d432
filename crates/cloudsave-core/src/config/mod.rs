pub mod secret;
pub mod settings;

use crate::error::{CloudSaveError, Result};
use crate::types::BackendKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level CloudSave configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSaveConfig {
    pub cloudsave: CloudSaveSettings,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSaveSettings {
    /// Number of revisions kept on each store target after a store.
    #[serde(default = "default_revisions_to_keep")]
    pub revisions_to_keep: usize,
    /// Where restored archives are unpacked.
    pub restore_root: String,
    /// Directories stored when `cloudsave store` gets no arguments.
    #[serde(default)]
    pub directories: Vec<String>,
    /// Directory holding one settings file per backend.
    pub settings_dir: String,
    /// Key file used to protect cached credentials.
    #[serde(default = "default_secret_key_path")]
    pub secret_key_path: String,
}

fn default_revisions_to_keep() -> usize {
    5
}

fn default_secret_key_path() -> String {
    "secret.key".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackendKind,
    /// Bucket name, or the target folder for `local`.
    pub bucket: String,
    /// Key prefix under which archives live.
    #[serde(default)]
    pub prefix: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Use path-style addressing. Default: true for S3Compatible, false for S3.
    #[serde(default)]
    pub path_style: Option<bool>,
    /// S3 access key; may be protected (`enc:` prefix).
    #[serde(default)]
    pub access_key: Option<String>,
    /// S3 secret key; may be protected (`enc:` prefix).
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_true")]
    pub store_target: bool,
    #[serde(default = "default_true")]
    pub restore_source: bool,
}

fn default_true() -> bool {
    true
}

impl CloudSaveConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CloudSaveError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CloudSaveError::TomlDe(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CloudSaveError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.cloudsave.revisions_to_keep == 0 {
            return Err(CloudSaveError::Config(
                "revisions_to_keep must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.name.is_empty()
                || backend.name.contains(['/', '\\'])
                || backend.name.starts_with('.')
            {
                return Err(CloudSaveError::Config(format!(
                    "invalid backend name '{}'",
                    backend.name
                )));
            }
            if !seen.insert(backend.name.as_str()) {
                return Err(CloudSaveError::Config(format!(
                    "duplicate backend name '{}'",
                    backend.name
                )));
            }
        }

        let mut names = HashSet::new();
        for dir in &self.cloudsave.directories {
            let Some(name) = Path::new(dir).file_name() else {
                return Err(CloudSaveError::Config(format!(
                    "directory '{dir}' has no name component"
                )));
            };
            // The name is the archive name, so it must be unique.
            if !names.insert(name) {
                return Err(CloudSaveError::Config(format!(
                    "more than one directory named '{}'",
                    name.to_string_lossy()
                )));
            }
        }
        Ok(())
    }

    /// Default config for `cloudsave init`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            cloudsave: CloudSaveSettings {
                revisions_to_keep: default_revisions_to_keep(),
                restore_root: base_dir.join("restore").display().to_string(),
                directories: vec![],
                settings_dir: base_dir.join("settings").display().to_string(),
                secret_key_path: base_dir.join("secret.key").display().to_string(),
            },
            backends: vec![],
        }
    }

    /// Resolve the config file path: `<base_dir>/cloudsave.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("cloudsave.toml")
    }

    /// Resolve the default home directory: `~/.cloudsave`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".cloudsave"))
            .ok_or_else(|| CloudSaveError::Config("Cannot determine home directory".to_string()))
    }

    pub fn directories(&self) -> Vec<PathBuf> {
        self.cloudsave.directories.iter().map(PathBuf::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_backend(name: &str) -> BackendConfig {
        BackendConfig {
            name: name.to_string(),
            kind: BackendKind::Local,
            bucket: "/tmp/cloudsave".to_string(),
            prefix: None,
            region: None,
            endpoint_url: None,
            path_style: None,
            access_key: None,
            secret_key: None,
            store_target: true,
            restore_source: true,
        }
    }

    #[test]
    fn roundtrip_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cloudsave.toml");
        let mut config = CloudSaveConfig::default_config(tmp.path());
        config.backends.push(local_backend("nas"));
        config.save(&path).unwrap();

        let loaded = CloudSaveConfig::load(&path).unwrap();
        assert_eq!(loaded.cloudsave.revisions_to_keep, 5);
        assert_eq!(loaded.backends.len(), 1);
        assert_eq!(loaded.backends[0].kind, BackendKind::Local);
        loaded.validate().unwrap();
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let result = CloudSaveConfig::load(Path::new("/nonexistent/cloudsave.toml"));
        assert!(matches!(result, Err(CloudSaveError::ConfigNotFound(_))));
    }

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let config: CloudSaveConfig = toml::from_str(
            r#"
            [cloudsave]
            restore_root = "/saves"
            settings_dir = "/cfg/settings"
            directories = ["/saves/Slot_1"]

            [[backends]]
            name = "minio"
            type = "s3compatible"
            bucket = "saves"
            region = "us-east-1"
            endpoint_url = "http://localhost:9000"
            restore_source = false
            "#,
        )
        .unwrap();

        assert_eq!(config.cloudsave.revisions_to_keep, 5);
        assert_eq!(config.cloudsave.secret_key_path, "secret.key");
        assert_eq!(config.backends[0].kind, BackendKind::S3Compatible);
        assert!(config.backends[0].store_target);
        assert!(!config.backends[0].restore_source);
        assert_eq!(config.directories(), vec![PathBuf::from("/saves/Slot_1")]);
    }

    #[test]
    fn validate_rejects_zero_retention() {
        let tmp = TempDir::new().unwrap();
        let mut config = CloudSaveConfig::default_config(tmp.path());
        config.cloudsave.revisions_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_directories_sharing_a_name() {
        let tmp = TempDir::new().unwrap();
        let mut config = CloudSaveConfig::default_config(tmp.path());
        config.cloudsave.directories = vec!["/games/a/Save".into(), "/games/b/Save".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than one directory named 'Save'"));

        config.cloudsave.directories = vec!["/games/a/Save".into(), "/games/b/Profile".into()];
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_and_bad_names() {
        let tmp = TempDir::new().unwrap();
        let mut config = CloudSaveConfig::default_config(tmp.path());
        config.backends = vec![local_backend("nas"), local_backend("nas")];
        assert!(config.validate().is_err());

        config.backends = vec![local_backend("a/b")];
        assert!(config.validate().is_err());
    }
}
