//! Pusher
//!
//! Streams every nonzero counter of every local cache to a remote dispatcher
//! as a sequence of SYNC requests. The remote OR-merges each batch, so a push
//! can be repeated or interleaved with other pushes without harm.
//!
//! The dispatcher lock is held only while one batch is being collected, never
//! across a network call. Each batch waits for the remote's acknowledgement
//! before the next one is collected.

use super::client::PeerClient;
use super::types::PushReport;
use crate::dispatcher::protocol::{CacheRequest, Operator, PUSH_BATCH_SIZE};
use crate::dispatcher::service::CacheService;
use crate::storage::types::BitWidth;

use anyhow::{Context, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound of ids inspected per lock acquisition, in batches.
const SCAN_WINDOW_BATCHES: u64 = 16;

pub async fn push_all(
    service: Arc<CacheService>,
    client: &PeerClient,
    target: &str,
) -> Result<PushReport> {
    push_all_with_batch(service, client, target, PUSH_BATCH_SIZE).await
}

/// Same as [`push_all`] with an explicit batch size.
///
/// Aborts on the first failed call. Batches already delivered stay merged on
/// the remote.
pub async fn push_all_with_batch(
    service: Arc<CacheService>,
    client: &PeerClient,
    target: &str,
    batch_size: usize,
) -> Result<PushReport> {
    let batch_size = batch_size.max(1);
    let mut report = PushReport {
        session: Uuid::new_v4().to_string(),
        target: target.to_string(),
        ..Default::default()
    };

    let caches = service.cache_list();
    tracing::info!(
        "[push {}] Pushing {} caches to {}",
        report.session,
        caches.len(),
        target
    );

    for (name, width) in caches {
        let (entries, batches) =
            push_cache(&service, client, target, &name, width, batch_size, &report.session)
                .await?;
        report.caches += 1;
        report.entries += entries;
        report.batches += batches;
    }

    tracing::info!(
        "[push {}] Done: {} caches, {} entries in {} batches to {}",
        report.session,
        report.caches,
        report.entries,
        report.batches,
        target
    );
    Ok(report)
}

async fn push_cache(
    service: &Arc<CacheService>,
    client: &PeerClient,
    target: &str,
    name: &str,
    width: BitWidth,
    batch_size: usize,
    session: &str,
) -> Result<(u64, u64)> {
    let scan_limit = batch_size as u64 * SCAN_WINDOW_BATCHES;
    let mut pending = CacheRequest::new(width.bits(), name, Operator::Sync);
    let mut cursor = Some(0u64);
    let mut entries = 0u64;
    let mut batches = 0u64;

    while let Some(from) = cursor {
        let wanted = batch_size - pending.ids.len();
        let collector = Arc::clone(service);
        let owned_name = name.to_string();
        let run = tokio::task::spawn_blocking(move || {
            collector.collect_nonzero(&owned_name, from, wanted, scan_limit)
        })
        .await
        .context("collecting nonzero counters")?;

        let Some(run) = run else {
            break;
        };
        cursor = run.resume_at;
        pending.ids.extend(run.ids);
        pending.flags.extend(run.flags);

        let full = pending.ids.len() >= batch_size;
        if full || (cursor.is_none() && !pending.ids.is_empty()) {
            let sent = pending.ids.len() as u64;
            client.request(target, &pending).await.with_context(|| {
                format!(
                    "[push {}] batch {} of cache '{}' to {} failed",
                    session,
                    batches + 1,
                    name,
                    target
                )
            })?;
            entries += sent;
            batches += 1;
            pending.ids.clear();
            pending.flags.clear();
        }
    }

    let info = service.info().into_iter().find(|info| info.name == name);
    if let Some(info) = info {
        tracing::info!(
            "[push {}] Cache '{}' width={} max_id={} count={}: {} entries sent",
            session,
            name,
            width,
            info.max_seen_id,
            info.occupancy,
            entries
        );
    }

    Ok((entries, batches))
}
