use super::protocol::{CacheRequest, CacheResponse};
use super::service::CacheService;
use crate::error::CacheError;
use crate::storage::types::CacheInfo;

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use std::sync::Arc;

/// Executes one request against the dispatcher.
///
/// A body that does not decode is reported like any other input error.
pub async fn handle_request(
    Extension(service): Extension<Arc<CacheService>>,
    payload: Result<Json<CacheRequest>, JsonRejection>,
) -> Result<Json<CacheResponse>, CacheError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        CacheError::MalformedBody(rejection.body_text())
    })?;

    let name = req.name.clone();
    let operator = req.operator.clone();
    let label = format!("Request {} on '{}'", operator, name);

    match run_blocking(&label, move || service.dispatch(req)).await {
        Ok(response) => {
            tracing::debug!(
                "{} on '{}' -> {} ids, {} flags",
                operator,
                name,
                response.ids.len(),
                response.flags.len()
            );
            Ok(Json(response))
        }
        Err(e @ CacheError::Internal(_)) => Err(e),
        Err(e) => {
            tracing::warn!("Rejected {} on '{}': {}", operator, name, e);
            Err(e)
        }
    }
}

/// Runs `work` on the blocking pool.
///
/// Aging a multi-billion-id cache is pure CPU work, so it must not sit on an
/// async worker. A panic inside `work` ends up here as a `JoinError` and is
/// reported as an internal error.
pub(crate) async fn run_blocking<T, F>(label: &str, work: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("{} aborted: {}", label, e);
            Err(CacheError::Internal(e.to_string()))
        }
    }
}

pub async fn handle_list_caches(
    Extension(service): Extension<Arc<CacheService>>,
) -> Json<Vec<CacheInfo>> {
    Json(service.info())
}
