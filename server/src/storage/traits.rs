use async_trait::async_trait;
use bytes::Bytes;
use charm_types::CharmUrl;
use futures::Stream;
use std::pin::Pin;

use super::error::StorageError;

/// Bundle bytes as they come out of the store. Dropping the stream releases
/// the underlying reader.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// A resolved charm revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmInfo {
    /// The requested URL with its revision filled in.
    pub url: CharmUrl,
    pub revision: u32,
    /// Hex SHA-256 of the bundle.
    pub sha256: String,
    pub size: u64,
}

#[async_trait]
pub trait CharmStore: Send + Sync {
    /// Resolves `url` to a revision; the latest one when it names none.
    async fn charm_info(&self, url: &CharmUrl) -> Result<CharmInfo, StorageError>;

    async fn open_charm(&self, url: &CharmUrl) -> Result<(CharmInfo, ByteStream), StorageError>;

    async fn inc_counter(&self, key: &[String]) -> Result<(), StorageError>;

    /// Sums the counter at `key`, or every counter under it when `prefix` is set.
    async fn sum_counter(&self, key: &[String], prefix: bool) -> Result<i64, StorageError>;
}
