use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{BlobStoreType, Config};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageConfig {
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        allow_http: bool,
    },
}

impl StorageConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Picks the blob store named by `blobstore`. Swift is reached through
    /// its S3-compatible API, which takes `tenant:user` as the access key.
    pub fn from_config(config: &Config, local_path: impl Into<PathBuf>) -> Self {
        match config.blobstore {
            BlobStoreType::File => Self::local(local_path),
            BlobStoreType::Swift => Self::S3 {
                bucket: config.swift_bucket.clone(),
                region: Some(config.swift_region.clone()),
                endpoint: Some(config.swift_auth_url.clone()),
                access_key_id: Some(format!(
                    "{}:{}",
                    config.swift_tenant, config.swift_username
                )),
                secret_access_key: Some(config.swift_secret.clone()),
                allow_http: config.swift_auth_url.starts_with("http://"),
            },
        }
    }
}
