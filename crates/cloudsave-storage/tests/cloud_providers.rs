/// Integration tests for the S3 and Google Cloud Storage backends.
///
/// These tests require real cloud credentials and are skipped if env vars are not set.
///
/// Run with:
///   CLOUDSAVE_S3_BUCKET=cloudsave-test \
///   CLOUDSAVE_S3_ENDPOINT=http://localhost:9000 \
///   GCS_TEST_BUCKET=cloudsave-test \
///   cargo test -p cloudsave-storage --features gcs --test cloud_providers -- --nocapture
use cloudsave_core::backend::StorageBackend;
use cloudsave_core::naming;

async fn roundtrip(backend: &dyn StorageBackend) {
    backend.initialize().await.expect("initialize failed");
    println!("OK: {} initialized", backend.name());

    let name = naming::encode("20000101000000".parse().unwrap(), "IntegrationTest");
    let data = b"Hello from CloudSave integration test".to_vec();

    assert!(backend.upload(&name, data.clone()).await.expect("upload failed"));
    println!("OK: upload");

    let archive = backend
        .list_archives()
        .await
        .expect("list failed")
        .into_iter()
        .find(|a| a.directory_name == "IntegrationTest")
        .expect("uploaded archive not listed");
    println!("OK: listed as {}", archive.remote_id);

    let downloaded = backend.download(&archive).await.expect("download failed");
    assert_eq!(downloaded, data);
    println!("OK: download matches");

    backend.delete(&archive).await.expect("delete failed");
    let still_there = backend
        .list_archives()
        .await
        .expect("list failed")
        .iter()
        .any(|a| a.remote_id == archive.remote_id);
    assert!(!still_there);
    println!("OK: delete");

    backend.dispose().await;
}

#[cfg(feature = "s3")]
mod s3_tests {
    use super::*;
    use cloudsave_storage::s3::{S3Backend, S3Options};

    fn get_s3_backend() -> Option<S3Backend> {
        let bucket = std::env::var("CLOUDSAVE_S3_BUCKET").ok()?;
        let endpoint_url = std::env::var("CLOUDSAVE_S3_ENDPOINT").ok();
        Some(S3Backend::new(S3Options {
            bucket,
            region: std::env::var("AWS_REGION").ok().or(Some("us-east-1".into())),
            name: "s3-test".into(),
            prefix: "cloudsave-test/".into(),
            path_style: endpoint_url.is_some(),
            endpoint_url,
            access_key: None,
            secret_key: None,
        }))
    }

    #[tokio::test]
    async fn s3_upload_list_download_delete() {
        let Some(backend) = get_s3_backend() else {
            eprintln!("SKIP: CLOUDSAVE_S3_BUCKET not set");
            return;
        };
        roundtrip(&backend).await;
    }
}

#[cfg(feature = "gcs")]
mod gcs_tests {
    use super::*;
    use cloudsave_storage::gcs::GcsBackend;

    fn get_gcs_backend() -> Option<GcsBackend> {
        let bucket = std::env::var("GCS_TEST_BUCKET").ok()?;
        if bucket.is_empty() {
            return None;
        }
        Some(GcsBackend::new(&bucket, "cloudsave-test/", "gcs-test"))
    }

    #[tokio::test]
    async fn gcs_upload_list_download_delete() {
        let Some(backend) = get_gcs_backend() else {
            eprintln!("SKIP: GCS_TEST_BUCKET not set");
            return;
        };
        roundtrip(&backend).await;
    }
}
