use bitmap_cluster::app::{NodeState, serve};
use bitmap_cluster::config::NodeConfig;
use bitmap_cluster::replication::puller::spawn_pull;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::parse();

    let log_filter = format!(
        "bitmap_cluster={0},bitmap_node={0},tower_http=warn",
        config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    install_panic_hook();

    tracing::info!("Starting node on {}", config.bind);
    tracing::info!(
        "Capacity: {} ids per cache ({} billion)",
        config.capacity(),
        config.billions
    );

    let state = NodeState::new(config.capacity());

    // 1. Listener. Failing to bind is the only fatal error.
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("HTTP server listening on {}", config.bind);

    // 2. Pull from peers once, after a short delay:
    if config.peers.is_empty() {
        tracing::info!("No peers configured, starting without sync");
    } else {
        tracing::info!("Peers: {:?}", config.peers);
        let pull = spawn_pull(
            state.client.clone(),
            state.board.clone(),
            config.peers.clone(),
            config.advertise_address(),
            config.sync_delay(),
        );
        tokio::spawn(async move {
            if let Err(e) = pull.await {
                tracing::error!("Pull round aborted: {}", e);
            }
        });
    }

    // 3. Spawn stats reporter:
    if let Some(period) = config.stats_interval() {
        let service = state.service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;
                service.log_info();
            }
        });
    }

    // 4. Serve:
    serve(listener, state).await?;

    Ok(())
}

/// Logs panics with a backtrace; the panicking task ends but the process
/// keeps serving.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!("Panic: {}\n{}", info, backtrace);
    }));
}
