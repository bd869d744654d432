#[cfg(feature = "gcs")]
mod inner {
    use async_trait::async_trait;
    use google_cloud_storage::client::{Client, ClientConfig};
    use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
    use google_cloud_storage::http::objects::download::Range;
    use google_cloud_storage::http::objects::get::GetObjectRequest;
    use google_cloud_storage::http::objects::list::ListObjectsRequest;
    use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
    use tokio::sync::RwLock;

    use cloudsave_core::backend::StorageBackend;
    use cloudsave_core::types::{ArchiveDescriptor, RemoteEntry};

    /// Google Cloud Storage backend, authenticated with application default
    /// credentials.
    pub struct GcsBackend {
        bucket: String,
        prefix: String,
        name: String,
        client: RwLock<Option<Client>>,
    }

    impl GcsBackend {
        pub fn new(bucket: &str, prefix: &str, name: &str) -> Self {
            Self {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                name: name.to_string(),
                client: RwLock::new(None),
            }
        }

        async fn client(&self) -> anyhow::Result<Client> {
            self.client
                .read()
                .await
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Not initialized"))
        }
    }

    #[async_trait]
    impl StorageBackend for GcsBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn initialize(&self) -> anyhow::Result<()> {
            let config = ClientConfig::default().with_auth().await?;
            let client = Client::new(config);

            // List objects with max_results=1 to verify access to the bucket
            client
                .list_objects(&ListObjectsRequest {
                    bucket: self.bucket.clone(),
                    max_results: Some(1),
                    ..Default::default()
                })
                .await?;

            *self.client.write().await = Some(client);
            Ok(())
        }

        async fn list_entries(&self) -> anyhow::Result<Vec<RemoteEntry>> {
            let client = self.client().await?;
            let mut entries = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let resp = client
                    .list_objects(&ListObjectsRequest {
                        bucket: self.bucket.clone(),
                        prefix: Some(self.prefix.clone()),
                        page_token: page_token.take(),
                        ..Default::default()
                    })
                    .await?;

                for object in resp.items.unwrap_or_default() {
                    let name = object
                        .name
                        .strip_prefix(&self.prefix)
                        .unwrap_or(&object.name)
                        .to_string();
                    entries.push(RemoteEntry::new(object.name.clone(), name));
                }

                match resp.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }

            Ok(entries)
        }

        async fn download(&self, archive: &ArchiveDescriptor) -> anyhow::Result<Vec<u8>> {
            let data = self
                .client()
                .await?
                .download_object(
                    &GetObjectRequest {
                        bucket: self.bucket.clone(),
                        object: archive.remote_id.clone(),
                        ..Default::default()
                    },
                    &Range::default(),
                )
                .await?;
            Ok(data)
        }

        async fn upload(&self, remote_filename: &str, data: Vec<u8>) -> anyhow::Result<bool> {
            let object = format!("{}{}", self.prefix, remote_filename.trim_start_matches('/'));
            let upload_type = UploadType::Simple(Media::new(object));
            self.client()
                .await?
                .upload_object(
                    &UploadObjectRequest {
                        bucket: self.bucket.clone(),
                        ..Default::default()
                    },
                    data,
                    &upload_type,
                )
                .await?;
            Ok(true)
        }

        async fn delete(&self, archive: &ArchiveDescriptor) -> anyhow::Result<()> {
            self.client()
                .await?
                .delete_object(&DeleteObjectRequest {
                    bucket: self.bucket.clone(),
                    object: archive.remote_id.clone(),
                    ..Default::default()
                })
                .await?;
            Ok(())
        }

        async fn dispose(&self) {
            self.client.write().await.take();
        }
    }
}

#[cfg(feature = "gcs")]
pub use inner::GcsBackend;
