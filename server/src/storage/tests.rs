#![allow(clippy::unwrap_used)]

use super::backend::ObjectStoreBackend;
use super::config::StorageConfig;
use super::error::StorageError;
use super::traits::CharmStore;
use bytes::Bytes;
use charm_types::CharmUrl;
use futures::TryStreamExt;
use tempfile::TempDir;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn create_test_backend() -> (ObjectStoreBackend, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::Local {
        path: temp_dir.path().to_path_buf(),
    };
    let backend = ObjectStoreBackend::from_config(config).unwrap();
    (backend, temp_dir)
}

fn url(s: &str) -> CharmUrl {
    s.parse().unwrap()
}

fn key(segments: &[&str]) -> Vec<String> {
    segments.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_publish_and_get_info() {
    let (backend, _dir) = create_test_backend();

    let info = backend
        .publish(&url("cs:precise/wordpress"), Bytes::from_static(b"hello"))
        .await
        .unwrap();
    assert_eq!(info.revision, 0);
    assert_eq!(info.sha256, HELLO_SHA256);
    assert_eq!(info.size, 5);
    assert_eq!(info.url.to_string(), "cs:precise/wordpress-0");

    let found = backend.charm_info(&url("cs:precise/wordpress")).await.unwrap();
    assert_eq!(found, info);
}

#[tokio::test]
async fn test_latest_and_explicit_revisions() {
    let (backend, _dir) = create_test_backend();
    let charm = url("cs:precise/mysql");

    backend.publish(&charm, Bytes::from_static(b"one")).await.unwrap();
    backend.publish(&charm, Bytes::from_static(b"two")).await.unwrap();
    backend
        .publish(&url("cs:precise/mysql-9"), Bytes::from_static(b"nine"))
        .await
        .unwrap();

    let latest = backend.charm_info(&charm).await.unwrap();
    assert_eq!(latest.revision, 9);

    let first = backend.charm_info(&url("cs:precise/mysql-0")).await.unwrap();
    assert_eq!(first.size, 3);

    let missing = backend.charm_info(&url("cs:precise/mysql-5")).await;
    assert!(matches!(missing, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn test_duplicate_revision_rejected() {
    let (backend, _dir) = create_test_backend();
    let charm = url("cs:precise/mysql-1");

    backend.publish(&charm, Bytes::from_static(b"a")).await.unwrap();
    let result = backend.publish(&charm, Bytes::from_static(b"b")).await;

    let err = result.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_get_nonexistent_charm() {
    let (backend, _dir) = create_test_backend();

    let err = backend
        .charm_info(&url("cs:precise/nothing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "charm not found: cs:precise/nothing");

    assert!(backend.open_charm(&url("cs:precise/nothing")).await.is_err());
}

#[tokio::test]
async fn test_user_and_global_charms_are_distinct() {
    let (backend, _dir) = create_test_backend();

    backend
        .publish(&url("cs:~bob/precise/mysql"), Bytes::from_static(b"bob's"))
        .await
        .unwrap();

    assert!(backend.charm_info(&url("cs:~bob/precise/mysql")).await.is_ok());
    assert!(backend.charm_info(&url("cs:precise/mysql")).await.is_err());
}

#[tokio::test]
async fn test_open_charm_streams_bundle() {
    let (backend, _dir) = create_test_backend();
    let payload: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();

    backend
        .publish(&url("cs:trusty/big"), Bytes::from(payload.clone()))
        .await
        .unwrap();

    let (info, stream) = backend.open_charm(&url("cs:trusty/big")).await.unwrap();
    assert_eq!(info.size, payload.len() as u64);

    let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), payload);
}

#[tokio::test]
async fn test_counters() {
    let (backend, _dir) = create_test_backend();

    for k in [
        key(&["charm-info", "trusty", "mysql"]),
        key(&["charm-info", "trusty", "mysql"]),
        key(&["charm-info", "trusty", "mysql", "bob"]),
        key(&["charm-info", "precise", "wordpress"]),
        key(&["charm-missing", "trusty", "nothing"]),
    ] {
        backend.inc_counter(&k).await.unwrap();
    }

    let exact = backend
        .sum_counter(&key(&["charm-info", "trusty", "mysql"]), false)
        .await
        .unwrap();
    assert_eq!(exact, 2);

    let mysql = backend
        .sum_counter(&key(&["charm-info", "trusty", "mysql"]), true)
        .await
        .unwrap();
    assert_eq!(mysql, 3);

    let info = backend
        .sum_counter(&key(&["charm-info"]), true)
        .await
        .unwrap();
    assert_eq!(info, 4);

    let partial_segment = backend
        .sum_counter(&key(&["charm"]), true)
        .await
        .unwrap();
    assert_eq!(partial_segment, 0);

    let unknown = backend
        .sum_counter(&key(&["charm-bundle", "trusty"]), false)
        .await
        .unwrap();
    assert_eq!(unknown, 0);
}

#[tokio::test]
async fn test_publish_after_last_revision() {
    let (backend, _dir) = create_test_backend();

    let last = backend
        .publish(&url("cs:precise/foo-4294967295"), Bytes::from_static(b"last"))
        .await
        .unwrap();
    assert_eq!(last.revision, u32::MAX);

    let err = backend
        .publish(&url("cs:precise/foo"), Bytes::from_static(b"more"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::RevisionsExhausted(_)));
    assert!(!err.is_not_found());

    let latest = backend.charm_info(&url("cs:precise/foo")).await.unwrap();
    assert_eq!(latest.sha256, last.sha256);
}
