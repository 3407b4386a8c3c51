//! Operator probe: marks a range of ids on a live node, reads a few back,
//! ages the cache and reads them again.

use bitmap_cluster::dispatcher::protocol::{CacheRequest, Operator};
use bitmap_cluster::replication::client::PeerClient;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bitmap-probe")]
#[command(about = "Exercise a bitmap node with SET / GET / SHIFT / GET")]
struct Cli {
    /// Node address
    #[arg(long, default_value = "127.0.0.1:12321")]
    node: String,

    /// Cache width in bits
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Cache name
    #[arg(long, default_value = "UidTest")]
    name: String,

    /// Number of SET requests
    #[arg(long, default_value_t = 256)]
    batches: i64,

    /// Ids per SET request
    #[arg(long, default_value_t = 8192)]
    batch_size: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let client = PeerClient::new();

    set_range(&client, &cli).await?;
    get_first_ten(&client, &cli).await?;

    let shift = CacheRequest::new(cli.width, &cli.name, Operator::Shift);
    let out = client.request(&cli.node, &shift).await?;
    tracing::info!("shift end, out len: {}", out.ids.len());

    get_first_ten(&client, &cli).await?;
    Ok(())
}

async fn set_range(client: &PeerClient, cli: &Cli) -> anyhow::Result<()> {
    for batch in 0..cli.batches {
        let ids: Vec<i64> = (batch * cli.batch_size..(batch + 1) * cli.batch_size).collect();
        let sent = ids.len();
        let request = CacheRequest::new(cli.width, &cli.name, Operator::Set).with_ids(ids);

        let out = client.request(&cli.node, &request).await?;
        tracing::info!("send: {} changed: {}", sent, out.ids.len());
    }
    Ok(())
}

async fn get_first_ten(client: &PeerClient, cli: &Cli) -> anyhow::Result<()> {
    let request = CacheRequest::new(cli.width, &cli.name, Operator::Get).with_ids((0..10).collect());
    let out = client.request(&cli.node, &request).await?;
    tracing::info!("get: {} ids, {} flags", out.ids.len(), out.flags.len());

    for (id, flags) in out.ids.iter().zip(&out.flags) {
        tracing::info!("id: {} flags: {}", id, flags);
    }
    Ok(())
}
