mod backend;
mod config;
mod error;
mod metadata;
mod traits;

#[cfg(test)]
mod tests;

pub use backend::ObjectStoreBackend;
pub use config::StorageConfig;
pub use error::StorageError;
pub use traits::{ByteStream, CharmInfo, CharmStore};
