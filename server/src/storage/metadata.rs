use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-charm index of published revisions, stored next to the bundles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub revisions: Vec<RevisionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
    pub revision: u32,
    pub sha256: String,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_revision(&mut self, revision: u32, sha256: String, size: u64) -> &RevisionMetadata {
        self.revisions.push(RevisionMetadata {
            revision,
            sha256,
            size,
            timestamp: Utc::now(),
        });
        &self.revisions[self.revisions.len() - 1]
    }

    /// Revisions start at zero. `None` once the latest revision is `u32::MAX`.
    pub fn next_revision(&self) -> Option<u32> {
        match self.latest() {
            Some(latest) => latest.revision.checked_add(1),
            None => Some(0),
        }
    }

    pub fn latest(&self) -> Option<&RevisionMetadata> {
        self.revisions.iter().max_by_key(|r| r.revision)
    }

    pub fn find(&self, revision: u32) -> Option<&RevisionMetadata> {
        self.revisions.iter().find(|r| r.revision == revision)
    }

    /// The requested revision, or the latest one.
    pub fn resolve(&self, revision: Option<u32>) -> Option<&RevisionMetadata> {
        match revision {
            Some(revision) => self.find(revision),
            None => self.latest(),
        }
    }
}
