//! `iou peers`: List the parties this party can trade with.

use clap::Args;
use serde::Deserialize;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct PeersArgs {
    #[command(flatten)]
    pub target: Target,
}

#[derive(Deserialize)]
struct PeersResponse {
    peers: Vec<String>,
    count: usize,
}

pub async fn run(args: &PeersArgs) -> anyhow::Result<()> {
    let data: PeersResponse = client::get(&args.target, "peers").await?;
    println!("Counterparties ({}):", data.count);
    for peer in &data.peers {
        println!("  {}", peer);
    }
    Ok(())
}
