use async_trait::async_trait;
use bytes::Bytes;
use charm_types::CharmUrl;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::StorageConfig;
use super::error::StorageError;
use super::metadata::{Metadata, RevisionMetadata};
use super::traits::{ByteStream, CharmInfo, CharmStore};

pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    counters: Mutex<BTreeMap<Vec<String>, i64>>,
}

impl ObjectStoreBackend {
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let store: Arc<dyn ObjectStore> = match config {
            StorageConfig::Local { path } => Arc::new(LocalFileSystem::new_with_prefix(path)?),
            StorageConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                allow_http,
            } => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .with_allow_http(allow_http);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(key) = access_key_id {
                    builder = builder.with_access_key_id(key);
                }
                if let Some(secret) = secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                Arc::new(builder.build()?)
            }
        };
        Ok(Self::new(store))
    }

    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            counters: Mutex::new(BTreeMap::new()),
        }
    }

    fn metadata_path(url: &CharmUrl) -> Path {
        Path::from(format!("{}/metadata.json", url.to_path()))
    }

    fn bundle_path(url: &CharmUrl, revision: u32) -> Path {
        Path::from(format!("{}/revisions/{revision}/bundle", url.to_path()))
    }

    async fn read_metadata(&self, url: &CharmUrl) -> Result<Option<Metadata>, StorageError> {
        let path = Self::metadata_path(url);
        match self.store.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_metadata(&self, url: &CharmUrl, metadata: &Metadata) -> Result<(), StorageError> {
        let path = Self::metadata_path(url);
        let json = serde_json::to_vec_pretty(metadata)?;
        self.store.put(&path, PutPayload::from(json)).await?;
        Ok(())
    }

    async fn resolve(&self, url: &CharmUrl) -> Result<CharmInfo, StorageError> {
        let metadata = self.read_metadata(url).await?;
        let found = metadata.as_ref().and_then(|m| m.resolve(url.revision));
        match found {
            Some(revision) => Ok(charm_info(url, revision)),
            None => Err(StorageError::NotFound(url.to_string())),
        }
    }

    /// Stores `bundle` as a new revision of `url`: the revision the URL
    /// names, or the one after the latest.
    pub async fn publish(&self, url: &CharmUrl, bundle: Bytes) -> Result<CharmInfo, StorageError> {
        let mut metadata = self.read_metadata(url).await?.unwrap_or_else(Metadata::new);
        let revision = match url.revision {
            Some(revision) => revision,
            None => metadata
                .next_revision()
                .ok_or_else(|| StorageError::RevisionsExhausted(url.to_string()))?,
        };
        if metadata.find(revision).is_some() {
            return Err(StorageError::AlreadyExists(url.with_revision(revision).to_string()));
        }

        let sha256 = format!("{:x}", Sha256::digest(&bundle));
        let size = bundle.len() as u64;
        self.store
            .put(&Self::bundle_path(url, revision), PutPayload::from(bundle))
            .await?;

        let info = charm_info(url, metadata.add_revision(revision, sha256, size));
        self.write_metadata(url, &metadata).await?;

        debug!(url = %info.url, size, "published charm");
        Ok(info)
    }
}

fn charm_info(url: &CharmUrl, revision: &RevisionMetadata) -> CharmInfo {
    CharmInfo {
        url: url.with_revision(revision.revision),
        revision: revision.revision,
        sha256: revision.sha256.clone(),
        size: revision.size,
    }
}

#[async_trait]
impl CharmStore for ObjectStoreBackend {
    async fn charm_info(&self, url: &CharmUrl) -> Result<CharmInfo, StorageError> {
        self.resolve(url).await
    }

    async fn open_charm(&self, url: &CharmUrl) -> Result<(CharmInfo, ByteStream), StorageError> {
        let info = self.resolve(url).await?;
        let result = match self.store.get(&Self::bundle_path(url, info.revision)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(info.url.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let stream = result.into_stream().map_err(StorageError::from);
        Ok((info, Box::pin(stream)))
    }

    async fn inc_counter(&self, key: &[String]) -> Result<(), StorageError> {
        let mut counters = self.counters.lock().await;
        *counters.entry(key.to_vec()).or_insert(0) += 1;
        Ok(())
    }

    async fn sum_counter(&self, key: &[String], prefix: bool) -> Result<i64, StorageError> {
        let counters = self.counters.lock().await;
        if !prefix {
            return Ok(counters.get(key).copied().unwrap_or(0));
        }
        // Keys sharing a prefix sort next to each other.
        Ok(counters
            .range(key.to_vec()..)
            .take_while(|(k, _)| k.starts_with(key))
            .map(|(_, count)| count)
            .sum())
    }
}
