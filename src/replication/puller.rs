//! Puller
//!
//! Asks every configured peer to open a reverse connection and push its full
//! state into this node. Each peer is handled by its own task, so a peer that
//! cannot be dialed or hangs never holds up the others.

use super::client::PeerClient;
use super::types::{PullOutcome, SyncBoard};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Starts one pull round in the background after `delay`.
///
/// The returned handle resolves to one outcome per peer, in configuration
/// order. Every outcome is also recorded on `board`.
pub fn spawn_pull(
    client: PeerClient,
    board: Arc<SyncBoard>,
    peers: Vec<String>,
    own_address: String,
    delay: Duration,
) -> JoinHandle<Vec<PullOutcome>> {
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::info!("Pulling state from {} peer(s)", peers.len());

        let handles: Vec<(String, JoinHandle<PullOutcome>)> = peers
            .into_iter()
            .map(|peer| {
                let client = client.clone();
                let own_address = own_address.clone();
                let task_peer = peer.clone();
                let handle =
                    tokio::spawn(async move { pull_from(&client, &task_peer, &own_address).await });
                (peer, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (peer, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Pull task for {} aborted: {}", peer, e);
                    PullOutcome::failed(&peer, e)
                }
            };
            board.record(outcome.clone());
            outcomes.push(outcome);
        }

        let completed = outcomes.iter().filter(|o| o.is_completed()).count();
        tracing::info!(
            "Pull round finished: {}/{} peers synced",
            completed,
            outcomes.len()
        );
        outcomes
    })
}

async fn pull_from(client: &PeerClient, peer: &str, own_address: &str) -> PullOutcome {
    tracing::info!("Requesting reverse sync from {} back to {}", peer, own_address);

    match client.reverse_sync(peer, own_address).await {
        Ok(true) => {
            tracing::info!("Reverse sync from {} completed", peer);
            PullOutcome::completed(peer)
        }
        Ok(false) => {
            tracing::warn!("Peer {} declined reverse sync", peer);
            PullOutcome::failed(peer, "peer declined reverse sync")
        }
        Err(e) => {
            tracing::warn!("Reverse sync from {} failed, skipping: {:#}", peer, e);
            PullOutcome::failed(peer, format!("{:#}", e))
        }
    }
}
