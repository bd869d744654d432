//! The fixed set of backend variants, instantiated from config at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloudsave_core::backend::StorageBackend;
use cloudsave_core::config::{BackendConfig, CloudSaveConfig};
use cloudsave_core::config::secret::{self, SecretKey};
use cloudsave_core::config::settings::{FileSettingsStore, SettingsStore};
use cloudsave_core::fleet::Fleet;
use cloudsave_core::orchestrator::BackupOrchestrator;
use cloudsave_core::packer::ZipPacker;
use cloudsave_core::types::BackendKind;

use crate::local::LocalBackend;

const ACCESS_KEY: &str = "AccessKey";
const SECRET_KEY: &str = "SecretKey";

/// Build the fleet described by `config`: one orchestrator per backend,
/// sharing a zip packer that unpacks into the restore root.
///
/// Relative paths in the config are resolved against `base_dir`.
pub fn build_fleet(config: &CloudSaveConfig, base_dir: &Path) -> anyhow::Result<Fleet> {
    config.validate()?;

    let settings = &config.cloudsave;
    let key = SecretKey::load_or_create(&resolve_path(base_dir, &settings.secret_key_path))?;
    let packer = Arc::new(ZipPacker::new(resolve_path(base_dir, &settings.restore_root)));
    let backends = build_backends(
        &config.backends,
        base_dir,
        &resolve_path(base_dir, &settings.settings_dir),
        &key,
    )?;

    let orchestrators = config
        .backends
        .iter()
        .zip(backends)
        .map(|(bc, backend)| {
            Arc::new(
                BackupOrchestrator::new(backend, packer.clone())
                    .with_roles(bc.store_target, bc.restore_source),
            )
        })
        .collect();

    Ok(Fleet::new(orchestrators))
}

pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Build one backend per config entry, in config order.
pub fn build_backends(
    configs: &[BackendConfig],
    base_dir: &Path,
    settings_dir: &Path,
    key: &SecretKey,
) -> anyhow::Result<Vec<Arc<dyn StorageBackend>>> {
    configs
        .iter()
        .map(|bc| {
            let settings = FileSettingsStore::for_backend(settings_dir, &bc.name);
            build_backend(bc, base_dir, &settings, key)
        })
        .collect()
}

/// Instantiate the variant named by `bc.kind`. A relative `local` bucket
/// is resolved against `base_dir`.
#[cfg_attr(not(feature = "s3"), allow(unused_variables))]
pub fn build_backend(
    bc: &BackendConfig,
    base_dir: &Path,
    settings: &dyn SettingsStore,
    key: &SecretKey,
) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match bc.kind {
        BackendKind::Local => Arc::new(LocalBackend::new(
            &resolve_path(base_dir, &bc.bucket),
            &bc.name,
        )),

        #[cfg(feature = "s3")]
        BackendKind::S3 | BackendKind::S3Compatible => {
            let (access_key, secret_key) = resolve_credentials(bc, settings, key)?;
            let compatible = bc.kind == BackendKind::S3Compatible;

            let endpoint_url = match (&bc.endpoint_url, compatible) {
                (None, true) => anyhow::bail!(
                    "Backend '{}': S3Compatible requires 'endpoint_url'",
                    bc.name
                ),
                (endpoint, _) => endpoint.clone(),
            };
            let region = match (&bc.region, compatible) {
                (None, true) => Some("us-east-1".to_string()),
                (region, _) => region.clone(),
            };

            Arc::new(crate::s3::S3Backend::new(crate::s3::S3Options {
                bucket: bc.bucket.clone(),
                region,
                name: bc.name.clone(),
                prefix: bc.prefix.clone().unwrap_or_default(),
                endpoint_url,
                path_style: bc.path_style.unwrap_or(compatible),
                access_key,
                secret_key,
            }))
        }

        #[cfg(not(feature = "s3"))]
        BackendKind::S3 | BackendKind::S3Compatible => {
            anyhow::bail!("s3 feature not enabled. Recompile with --features s3")
        }

        #[cfg(feature = "gcs")]
        BackendKind::Gcs => Arc::new(crate::gcs::GcsBackend::new(
            &bc.bucket,
            bc.prefix.as_deref().unwrap_or_default(),
            &bc.name,
        )),

        #[cfg(not(feature = "gcs"))]
        BackendKind::Gcs => {
            anyhow::bail!("gcs feature not enabled. Recompile with --features gcs")
        }
    };

    tracing::debug!("Registered backend '{}' ({})", bc.name, bc.kind);
    Ok(backend)
}

/// Credentials from config win and are cached, protected, in the backend's
/// settings; without them, the cached pair is used.
pub fn resolve_credentials(
    bc: &BackendConfig,
    settings: &dyn SettingsStore,
    key: &SecretKey,
) -> anyhow::Result<(Option<String>, Option<String>)> {
    if let (Some(ak), Some(sk)) = (&bc.access_key, &bc.secret_key) {
        let access_key = secret::unprotect(ak, key)?;
        let secret_key = secret::unprotect(sk, key)?;
        settings.set(ACCESS_KEY, &secret::protect(&access_key, key)?)?;
        settings.set(SECRET_KEY, &secret::protect(&secret_key, key)?)?;
        return Ok((Some(access_key), Some(secret_key)));
    }

    match (settings.get(ACCESS_KEY)?, settings.get(SECRET_KEY)?) {
        (Some(ak), Some(sk)) => Ok((
            Some(secret::unprotect(&ak, key)?),
            Some(secret::unprotect(&sk, key)?),
        )),
        _ => Ok((None, None)),
    }
}
