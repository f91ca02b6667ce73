mod counter;
mod url;

use serde::{Deserialize, Serialize};

pub use counter::{CounterKey, CounterKeyError};
pub use url::{CharmUrl, Schema, UrlError};

/// Per-charm entry of a `/charm-info` response.
///
/// Failures are reported per entry in `errors`; a lookup that failed still
/// produces an entry with a zero revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharmInfoResponse {
    /// Zero is a valid revision, so it is always serialized.
    pub revision: u32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
