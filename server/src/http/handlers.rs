use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use charm_types::{CharmInfoResponse, CharmUrl, CounterKey, UrlError};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::{
    dto::InfoResponse,
    error::{ApiError, ApiResult},
    state::AppState,
};
use crate::storage::CharmStore;

/// Fixed path answered for external liveness probes.
pub const LIVENESS_PATH: &str = "/mu-35700a31-6bf320ca-a800b670-05f845ee";

pub const DOCS_URL: &str = "https://juju.ubuntu.com";

const COUNTER_PREFIX: &str = "counter/";

/// Query pairs in request order; repeated keys are significant.
type Params = Query<Vec<(String, String)>>;

/// Counting is on unless the first `stats` parameter is exactly "0".
fn stats_enabled(params: &[(String, String)]) -> bool {
    !params
        .iter()
        .find(|(key, _)| key == "stats")
        .is_some_and(|(_, value)| value == "0")
}

/// Increments `key` in the background. The response never waits for it.
fn count(state: &AppState, key: CounterKey) {
    let store = Arc::clone(&state.store);
    tokio::spawn(async move {
        if let Err(err) = store.inc_counter(key.segments()).await {
            warn!(key = %key, error = %err, "cannot increment counter");
        }
    });
}

/// Looks up one requested identifier. The counter key is returned when the
/// outcome is one that gets counted.
async fn lookup(store: &dyn CharmStore, id: &str) -> (CharmInfoResponse, Option<CounterKey>) {
    let url = match id.parse::<CharmUrl>() {
        Ok(url) => url,
        Err(err) => {
            let entry = CharmInfoResponse {
                errors: vec![err.to_string()],
                ..CharmInfoResponse::default()
            };
            return (entry, None);
        }
    };

    match store.charm_info(&url).await {
        Ok(info) => {
            let entry = CharmInfoResponse {
                revision: info.revision,
                sha256: info.sha256,
                ..CharmInfoResponse::default()
            };
            (entry, Some(CounterKey::for_charm("charm-info", &url)))
        }
        Err(err) => {
            let counted = if err.is_not_found() {
                Some(CounterKey::for_charm("charm-missing", &url))
            } else {
                warn!(url = %url, error = %err, "charm info lookup failed");
                None
            };
            let entry = CharmInfoResponse {
                errors: vec![err.to_string()],
                ..CharmInfoResponse::default()
            };
            (entry, counted)
        }
    }
}

/// GET /charm-info?charms=<id>&charms=<id>...
/// Resolves every requested charm; failures are reported per entry.
#[instrument(skip(state, params))]
pub async fn serve_info(State(state): State<Arc<AppState>>, Query(params): Params) -> Json<InfoResponse> {
    let stats = stats_enabled(&params);
    let mut response = InfoResponse::new();

    for (_, id) in params.iter().filter(|(key, _)| key == "charms") {
        let (entry, counted) = lookup(state.store.as_ref(), id).await;
        if let Some(key) = counted.filter(|_| stats) {
            count(&state, key);
        }
        response.insert(id.clone(), entry);
    }

    Json(response)
}

/// GET /charm/<series>/<name>[-<revision>]
/// Streams the charm bundle.
#[instrument(skip(state, params))]
pub async fn serve_charm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Params,
) -> ApiResult<Response> {
    let url: CharmUrl = format!("cs:{id}")
        .parse()
        .map_err(|err: UrlError| ApiError::NotFound(err.to_string()))?;

    let (info, stream) = state.store.open_charm(&url).await?;
    debug!(url = %info.url, size = info.size, "serving charm");

    if stats_enabled(&params) {
        count(&state, CounterKey::for_charm("charm-bundle", &url));
    }

    let charm = info.url;
    let body = Body::from_stream(stream.inspect_err(move |err| {
        error!(url = %charm, error = %err, "charm download interrupted");
    }));

    Ok((
        [
            (header::CONNECTION, HeaderValue::from_static("close")),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(info.size)),
        ],
        body,
    )
        .into_response())
}

/// GET /stats/counter/<key>
/// Returns the counter sum for an exact key, or for every key under a
/// `:*` prefix.
#[instrument(skip(state))]
pub async fn serve_stats(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let Some(suffix) = path.strip_prefix(COUNTER_PREFIX) else {
        return Err(ApiError::NotFound(format!("unknown stats endpoint {path:?}")));
    };

    let key: CounterKey = suffix.parse()?;
    let sum = state
        .store
        .sum_counter(key.segments(), key.is_prefix())
        .await
        .map_err(|err| {
            error!(key = %key, error = %err, "cannot sum counter");
            ApiError::Internal
        })?;

    let body = sum.to_string();
    let mut response = (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain")),
            (header::CONTENT_LENGTH, HeaderValue::from(body.len())),
        ],
        body,
    )
        .into_response();

    if let Some(max_age) = state.stats_cache_max_age {
        let value = format!("public, max-age={}", max_age.as_secs());
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }

    Ok(response)
}

pub async fn serve_liveness_key() -> impl IntoResponse {
    (
        [
            (header::CONNECTION, "close"),
            (header::CONTENT_TYPE, "text/plain"),
            (header::CONTENT_LENGTH, "2"),
        ],
        "42",
    )
}

pub async fn redirect_root() -> Redirect {
    Redirect::to(DOCS_URL)
}
