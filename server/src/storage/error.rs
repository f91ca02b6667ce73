use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("charm not found: {0}")]
    NotFound(String),

    #[error("charm already exists: {0}")]
    AlreadyExists(String),

    #[error("no revisions left for charm: {0}")]
    RevisionsExhausted(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("cannot decode charm metadata: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Whether the failure means the charm does not exist, as opposed to the
    /// store failing to answer. Only the former is counted as a miss.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::AlreadyExists(_)
            | StorageError::RevisionsExhausted(_)
            | StorageError::ObjectStore(_)
            | StorageError::Serialization(_) => false,
        }
    }
}
