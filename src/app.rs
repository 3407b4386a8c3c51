//! HTTP surface of a node: router construction and serving.

use crate::dispatcher::handlers::{handle_list_caches, handle_request};
use crate::dispatcher::protocol::{
    ENDPOINT_CACHES, ENDPOINT_REQUEST, ENDPOINT_REVERSE_SYNC, ENDPOINT_SYNC_STATUS,
};
use crate::dispatcher::service::CacheService;
use crate::replication::client::PeerClient;
use crate::replication::handlers::{handle_reverse_sync, handle_sync_status};
use crate::replication::types::SyncBoard;

use axum::extract::DefaultBodyLimit;
use axum::{
    Extension, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// A full push batch of JSON-encoded pairs is far above axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Everything the handlers share.
#[derive(Clone)]
pub struct NodeState {
    pub service: Arc<CacheService>,
    pub client: PeerClient,
    pub board: Arc<SyncBoard>,
}

impl NodeState {
    pub fn new(capacity: u64) -> Self {
        Self {
            service: CacheService::new(capacity),
            client: PeerClient::new(),
            board: SyncBoard::new(),
        }
    }
}

pub fn build_app(state: &NodeState) -> Router {
    Router::new()
        .route(ENDPOINT_REQUEST, post(handle_request))
        .route(ENDPOINT_REVERSE_SYNC, post(handle_reverse_sync))
        .route(ENDPOINT_CACHES, get(handle_list_caches))
        .route(ENDPOINT_SYNC_STATUS, get(handle_sync_status))
        .layer(Extension(state.service.clone()))
        .layer(Extension(state.client.clone()))
        .layer(Extension(state.board.clone()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Serves the node on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: NodeState) -> anyhow::Result<()> {
    let app = build_app(&state);
    axum::serve(listener, app).await?;
    Ok(())
}
