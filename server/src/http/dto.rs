use charm_types::CharmInfoResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a `/charm-info` response, keyed by the identifier as requested.
pub type InfoResponse = BTreeMap<String, CharmInfoResponse>;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
