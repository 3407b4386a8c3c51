use super::client::PeerClient;
use super::pusher::push_all;
use super::types::{PullOutcome, SyncBoard};
use crate::dispatcher::protocol::{ErrorResponse, ReverseSyncRequest, ReverseSyncResponse};
use crate::dispatcher::service::CacheService;

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

/// Pushes this node's full state to the address in the request.
///
/// The push runs in its own task: it is never cancelled, even if the caller
/// goes away, and runs to completion or failure.
pub async fn handle_reverse_sync(
    Extension(service): Extension<Arc<CacheService>>,
    Extension(client): Extension<PeerClient>,
    payload: Result<Json<ReverseSyncRequest>, JsonRejection>,
) -> Result<Json<ReverseSyncResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("Rejected reverse sync body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("malformed request body: {}", rejection.body_text()),
            }),
        )
    })?;

    tracing::info!("Reverse sync requested by {}", req.address);

    let target = req.address.clone();
    let push = tokio::spawn(async move { push_all(service, &client, &target).await });

    match push.await {
        Ok(Ok(report)) => {
            tracing::info!(
                "[push {}] Reverse sync to {} succeeded",
                report.session,
                req.address
            );
            Ok(Json(ReverseSyncResponse { success: true }))
        }
        Ok(Err(e)) => {
            tracing::error!("Reverse sync to {} failed: {:#}", req.address, e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("{:#}", e),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("Reverse sync to {} aborted: {}", req.address, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

pub async fn handle_sync_status(
    Extension(board): Extension<Arc<SyncBoard>>,
) -> Json<Vec<PullOutcome>> {
    Json(board.snapshot())
}
