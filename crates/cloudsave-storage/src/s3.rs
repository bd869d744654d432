#[cfg(feature = "s3")]
mod inner {
    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::primitives::ByteStream;
    use tokio::sync::RwLock;

    use cloudsave_core::backend::StorageBackend;
    use cloudsave_core::types::{ArchiveDescriptor, RemoteEntry};

    /// AWS S3 and S3-compatible backend.
    ///
    /// Works with AWS S3, MinIO, Garage, Ceph RGW and any other service
    /// implementing the S3 API. The client is built in `initialize` and
    /// dropped in `dispose`.
    pub struct S3Backend {
        options: S3Options,
        client: RwLock<Option<Client>>,
    }

    /// Options for creating an S3 backend.
    #[derive(Debug, Clone, Default)]
    pub struct S3Options {
        pub bucket: String,
        pub region: Option<String>,
        pub name: String,
        /// Key prefix for archives, e.g. `cloudsave/`.
        pub prefix: String,
        /// Custom endpoint URL (e.g. `http://localhost:9000` for MinIO).
        pub endpoint_url: Option<String>,
        /// Force path-style addressing (`http://host/bucket/key`).
        /// Most S3-compatible servers require this.
        pub path_style: bool,
        /// Explicit access key. If None, uses env/profile credentials.
        pub access_key: Option<String>,
        /// Explicit secret key. If None, uses env/profile credentials.
        pub secret_key: Option<String>,
    }

    impl S3Backend {
        pub fn new(options: S3Options) -> Self {
            Self {
                options,
                client: RwLock::new(None),
            }
        }

        fn key(&self, remote_filename: &str) -> String {
            format!(
                "{}{}",
                self.options.prefix,
                remote_filename.trim_start_matches('/')
            )
        }

        async fn client(&self) -> anyhow::Result<Client> {
            self.client
                .read()
                .await
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Not initialized"))
        }

        async fn build_client(&self) -> Client {
            let opts = &self.options;
            let mut config_loader = aws_config::from_env();

            if let Some(r) = &opts.region {
                config_loader = config_loader.region(aws_config::Region::new(r.clone()));
            }

            if let (Some(ak), Some(sk)) = (&opts.access_key, &opts.secret_key) {
                let creds = aws_sdk_s3::config::Credentials::new(
                    ak.as_str(),
                    sk.as_str(),
                    None,
                    None,
                    "cloudsave-config",
                );
                config_loader = config_loader.credentials_provider(creds);
            }

            let sdk_config = config_loader.load().await;
            let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

            if let Some(endpoint) = &opts.endpoint_url {
                s3_config_builder = s3_config_builder.endpoint_url(endpoint.as_str());
            }
            if opts.path_style {
                s3_config_builder = s3_config_builder.force_path_style(true);
            }

            Client::from_conf(s3_config_builder.build())
        }
    }

    #[async_trait]
    impl StorageBackend for S3Backend {
        fn name(&self) -> &str {
            &self.options.name
        }

        async fn initialize(&self) -> anyhow::Result<()> {
            let client = self.build_client().await;
            client
                .head_bucket()
                .bucket(&self.options.bucket)
                .send()
                .await?;
            *self.client.write().await = Some(client);
            Ok(())
        }

        async fn list_entries(&self) -> anyhow::Result<Vec<RemoteEntry>> {
            let client = self.client().await?;
            let mut entries = Vec::new();
            let mut continuation: Option<String> = None;

            loop {
                let resp = client
                    .list_objects_v2()
                    .bucket(&self.options.bucket)
                    .prefix(&self.options.prefix)
                    .set_continuation_token(continuation.take())
                    .send()
                    .await?;

                for object in resp.contents() {
                    if let Some(key) = object.key() {
                        let name = key.strip_prefix(&self.options.prefix).unwrap_or(key);
                        entries.push(RemoteEntry::new(key, name));
                    }
                }

                match resp.next_continuation_token() {
                    Some(token) => continuation = Some(token.to_string()),
                    None => break,
                }
            }

            Ok(entries)
        }

        async fn download(&self, archive: &ArchiveDescriptor) -> anyhow::Result<Vec<u8>> {
            let resp = self
                .client()
                .await?
                .get_object()
                .bucket(&self.options.bucket)
                .key(&archive.remote_id)
                .send()
                .await?;
            let data = resp.body.collect().await?;
            Ok(data.to_vec())
        }

        async fn upload(&self, remote_filename: &str, data: Vec<u8>) -> anyhow::Result<bool> {
            self.client()
                .await?
                .put_object()
                .bucket(&self.options.bucket)
                .key(self.key(remote_filename))
                .body(ByteStream::from(data))
                .send()
                .await?;
            Ok(true)
        }

        async fn delete(&self, archive: &ArchiveDescriptor) -> anyhow::Result<()> {
            self.client()
                .await?
                .delete_object()
                .bucket(&self.options.bucket)
                .key(&archive.remote_id)
                .send()
                .await?;
            Ok(())
        }

        async fn dispose(&self) {
            self.client.write().await.take();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn calls_before_initialize_fail() {
            let backend = S3Backend::new(S3Options {
                bucket: "saves".into(),
                name: "s3-test".into(),
                ..Default::default()
            });
            let err = backend.list_entries().await.unwrap_err();
            assert!(err.to_string().contains("Not initialized"));
        }

        #[test]
        fn keys_carry_prefix_without_leading_slash() {
            let backend = S3Backend::new(S3Options {
                prefix: "cloudsave/".into(),
                ..Default::default()
            });
            assert_eq!(
                backend.key("/20240101120000_Save1.zip"),
                "cloudsave/20240101120000_Save1.zip"
            );
        }
    }
}

#[cfg(feature = "s3")]
pub use inner::{S3Backend, S3Options};
