//! Storage backends for CloudSave: a local folder, S3 (and compatibles)
//! and Google Cloud Storage, plus the registry building them from config.

pub mod gcs;
pub mod local;
pub mod registry;
pub mod s3;
